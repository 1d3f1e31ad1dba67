//! `PrimeSieve` struct and core implementation.

use core::fmt;
use std::thread;

use crate::{
    compute,
    iter::{Primes, PrimesRev},
    layout::{bit_address_of, segment_of, BITS_PER_SEG, MAX_THREADS, WORDS_PER_SEG},
    storage::{OutOfMemory, WordBuf},
};

/// A dynamically growing, bit-packed, odd-only prime sieve.
///
/// # Overview
///
/// The sieve owns a flat bitmap with one bit per odd number (0 = prime,
/// 1 = composite), organized in segments of 255255 bits with the multiples
/// of {3, 5, 7, 11, 13, 17} pre-struck from a shared template. Any query
/// whose argument lies beyond the computed bound transparently extends the
/// sieve, so the structure behaves as if it were infinite.
///
/// Extension sieves whole segments with a segmented sieve of Eratosthenes,
/// statically partitioned across worker threads. After growth, primality
/// queries are single bit tests.
///
/// # Examples
///
/// ```
/// use segsieve::PrimeSieve;
///
/// let mut sieve = PrimeSieve::new();
/// assert!(sieve.is_prime(127));
/// assert!(!sieve.is_prime(128));
///
/// assert_eq!(sieve.next_prime(127), 131);
/// assert_eq!(sieve.prev_prime(127), 113);
///
/// let squares: Vec<u64> = sieve.primes().take(4).map(|p| p * p).collect();
/// assert_eq!(squares, [4, 9, 25, 49]);
/// ```
///
/// # Growth
///
/// The bitmap grows monotonically in whole-segment units with geometric
/// (doubling) allocation; computed contents are preserved bitwise across
/// reallocation and a segment, once sieved, is never rewritten. There is no
/// shrinking. Memory use is roughly n/16 bytes for coverage up to n.
///
/// # Concurrency
///
/// All growing operations take `&mut self`, so a sieve is single-threaded
/// from the caller's perspective; internal worker threads are confined to
/// the compute engine and joined before any call returns.
pub struct PrimeSieve {
    buf: WordBuf,
    segs_computed: usize,
    threads: usize,
}

impl PrimeSieve {
    /// Creates an empty sieve with auto-detected thread count.
    ///
    /// Allocates nothing; the first query triggers the first computation.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// assert_eq!(sieve.computed_bound(), 0);
    /// assert!(sieve.is_prime(2));
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_threads(0, 0)
    }

    /// Creates a sieve pre-computed up to `x`, so primality queries for
    /// values `<= x` are constant time from the start.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::computed_to(1_000_000);
    /// assert!(sieve.computed_bound() >= 1_000_000);
    /// assert!(sieve.is_prime(999_983));
    /// ```
    #[must_use]
    pub fn computed_to(x: u64) -> Self {
        Self::with_threads(x, 0)
    }

    /// Creates a sieve pre-computed up to `x` using `num_threads` compute
    /// workers.
    ///
    /// `num_threads == 0` auto-detects the hardware thread count; explicit
    /// values are clamped to `1..=32`. The thread count only affects how
    /// fast segments are sieved, never the results.
    #[must_use]
    pub fn with_threads(x: u64, num_threads: usize) -> Self {
        let threads = if num_threads == 0 {
            auto_threads()
        } else {
            num_threads.min(MAX_THREADS)
        };
        let mut sieve = Self {
            buf: WordBuf::empty(),
            segs_computed: 0,
            threads,
        };
        sieve.grow_to(x);
        sieve
    }

    /// Extends the sieve so that primality queries for values `<= x` are
    /// constant time.
    ///
    /// Idempotent and monotone: growing to a bound at or below
    /// [`computed_bound`](Self::computed_bound) is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// sieve.grow_to(10_000_000);
    /// let bound = sieve.computed_bound();
    /// sieve.grow_to(5); // no-op
    /// assert_eq!(sieve.computed_bound(), bound);
    /// ```
    pub fn grow_to(&mut self, x: u64) {
        if x >= 3 {
            self.grow_segments((x - 1) / (BITS_PER_SEG << 1) + 1);
        }
    }

    /// Fallible variant of [`grow_to`](Self::grow_to).
    ///
    /// # Errors
    ///
    /// Returns [`OutOfMemory`] if the bitmap allocation fails; the sieve is
    /// left unchanged and remains usable.
    pub fn try_grow_to(&mut self, x: u64) -> Result<(), OutOfMemory> {
        if x >= 3 {
            self.try_grow_segments((x - 1) / (BITS_PER_SEG << 1) + 1)?;
        }
        Ok(())
    }

    /// Queries the primality of `x`, growing the sieve as necessary.
    ///
    /// Constant time once `x` is within the computed bound.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// assert!(!sieve.is_prime(0));
    /// assert!(!sieve.is_prime(1));
    /// assert!(sieve.is_prime(2));
    /// assert!(sieve.is_prime(3));
    /// assert!(!sieve.is_prime(510_511)); // 19 · 26869, first odd past segment 0
    /// ```
    pub fn is_prime(&mut self, x: u64) -> bool {
        if x == 2 {
            return true;
        }
        if x < 2 || x & 1 == 0 {
            return false;
        }
        let seg = segment_of(x);
        if seg >= self.segs_computed {
            self.grow_segments(seg as u64 + 1);
        }
        let (w, b) = bit_address_of(x);
        self.buf.as_slice()[w] >> b & 1 == 0
    }

    /// Returns the smallest prime strictly greater than `x`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// assert_eq!(sieve.next_prime(0), 2);
    /// assert_eq!(sieve.next_prime(2), 3);
    /// assert_eq!(sieve.next_prime(127), 131);
    /// ```
    pub fn next_prime(&mut self, x: u64) -> u64 {
        self.primes_from(x).advance()
    }

    /// Returns the largest prime strictly less than `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x <= 2`: no prime precedes 2.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// assert_eq!(sieve.prev_prime(127), 113);
    /// assert_eq!(sieve.prev_prime(3), 2);
    /// ```
    pub fn prev_prime(&mut self, x: u64) -> u64 {
        assert!(x > 2, "prev_prime requires x > 2: no prime precedes 2");
        match self.primes_back_from(x).next() {
            Some(p) => p,
            // Reverse iteration from x > 2 always yields at least 2.
            None => unreachable!(),
        }
    }

    /// Iterates over all primes in ascending order, starting at 2.
    ///
    /// The iterator is infinite: it grows the sieve one segment at a time as
    /// iteration runs off the computed end.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// let first: Vec<u64> = sieve.primes().take(10).collect();
    /// assert_eq!(first, [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    /// ```
    pub fn primes(&mut self) -> Primes<'_> {
        Primes::from_start(self)
    }

    /// Iterates over primes strictly greater than `x` in ascending order.
    ///
    /// Like [`primes`](Self::primes), the iterator is infinite.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// let run: Vec<u64> = sieve.primes_from(50).take(5).collect();
    /// assert_eq!(run, [53, 59, 61, 67, 71]);
    /// ```
    pub fn primes_from(&mut self, x: u64) -> Primes<'_> {
        if x < 2 {
            Primes::from_start(self)
        } else {
            Primes::from_value(self, x)
        }
    }

    /// Iterates over primes strictly less than `x` in descending order,
    /// ending after 2.
    ///
    /// # Examples
    ///
    /// ```
    /// # use segsieve::PrimeSieve;
    /// let mut sieve = PrimeSieve::new();
    /// let down: Vec<u64> = sieve.primes_back_from(12).collect();
    /// assert_eq!(down, [11, 7, 5, 3, 2]);
    /// assert_eq!(sieve.primes_back_from(2).count(), 0);
    /// ```
    pub fn primes_back_from(&mut self, x: u64) -> PrimesRev<'_> {
        if x > 2 {
            let seg = segment_of(x);
            if seg >= self.segs_computed {
                self.grow_segments(seg as u64 + 1);
            }
        }
        PrimesRev::from_value(self.computed_words(), x)
    }

    /// Largest odd integer whose primality is queryable without triggering
    /// growth, or 0 if nothing has been computed yet.
    #[must_use]
    #[inline]
    pub fn computed_bound(&self) -> u64 {
        match self.segs_computed {
            0 => 0,
            n => 2 * BITS_PER_SEG * n as u64 - 1,
        }
    }

    /// Number of compute worker threads this sieve uses.
    #[must_use]
    #[inline]
    pub const fn num_threads(&self) -> usize {
        self.threads
    }

    /// Fully sieved segments; only their words are queryable.
    #[inline(always)]
    pub(crate) const fn segs_computed(&self) -> usize {
        self.segs_computed
    }

    /// The queryable prefix of the bitmap.
    #[inline(always)]
    pub(crate) fn computed_words(&self) -> &[u64] {
        &self.buf.as_slice()[..self.segs_computed * WORDS_PER_SEG]
    }

    #[inline(always)]
    pub(crate) fn word(&self, idx: usize) -> u64 {
        self.buf.as_slice()[idx]
    }

    /// Rebuilds a sieve from a previously computed word snapshot.
    /// `words.len()` must equal `segs * WORDS_PER_SEG`.
    #[cfg(feature = "serde")]
    pub(crate) fn from_computed_words(segs: usize, words: &[u64]) -> Result<Self, OutOfMemory> {
        debug_assert_eq!(words.len(), segs * WORDS_PER_SEG);
        let mut buf = WordBuf::empty();
        if !words.is_empty() {
            buf.grow(words.len())?;
            buf.as_mut_slice().copy_from_slice(words);
        }
        Ok(Self {
            buf,
            segs_computed: segs,
            threads: auto_threads(),
        })
    }

    /// Ensures at least `need` segments are computed, aborting on
    /// allocation failure like the standard library collections.
    pub(crate) fn grow_segments(&mut self, need: u64) {
        if let Err(oom) = self.try_grow_segments(need) {
            std::alloc::handle_alloc_error(oom.layout());
        }
    }

    fn try_grow_segments(&mut self, need: u64) -> Result<(), OutOfMemory> {
        let need = usize::try_from(need).map_err(|_| OutOfMemory { words: usize::MAX })?;
        if need <= self.segs_computed {
            return Ok(());
        }
        let allocated = self.buf.words() / WORDS_PER_SEG;
        if need > allocated {
            let target = need.max(allocated * 2);
            let words = target
                .checked_mul(WORDS_PER_SEG)
                .ok_or(OutOfMemory { words: usize::MAX })?;
            self.buf.grow(words)?;
        }
        compute::compute_range(
            self.buf.as_mut_slice(),
            self.segs_computed,
            need,
            self.threads,
        );
        // Single publication point: queries only ever see fully sieved
        // segments.
        self.segs_computed = need;
        Ok(())
    }
}

fn auto_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get().min(MAX_THREADS))
}

impl Default for PrimeSieve {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PrimeSieve {
    fn clone(&self) -> Self {
        let mut buf = WordBuf::empty();
        let words = self.segs_computed * WORDS_PER_SEG;
        if words > 0 {
            if let Err(oom) = buf.grow(words) {
                std::alloc::handle_alloc_error(oom.layout());
            }
            buf.as_mut_slice().copy_from_slice(self.computed_words());
        }
        Self {
            buf,
            segs_computed: self.segs_computed,
            threads: self.threads,
        }
    }
}

impl fmt::Debug for PrimeSieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimeSieve")
            .field("computed_bound", &self.computed_bound())
            .field("segments", &self.segs_computed)
            .field("threads", &self.threads)
            .finish()
    }
}

impl<'a> IntoIterator for &'a mut PrimeSieve {
    type Item = u64;
    type IntoIter = Primes<'a>;

    /// Iterates over all primes from 2, equivalent to
    /// [`primes`](PrimeSieve::primes).
    fn into_iter(self) -> Self::IntoIter {
        self.primes()
    }
}
