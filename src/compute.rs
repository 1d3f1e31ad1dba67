//! Segmented sieve compute engine.
//!
//! [`compute_range`] extends the bitmap by sieving segments
//! `[seg_from, seg_to)`, assuming `[0, seg_from)` is already computed. Work
//! is statically block-partitioned across worker threads; each worker owns a
//! disjoint whole-segment word range, so the only synchronization is the
//! scope join.

use std::thread;

use crate::{
    layout::{fast_rem, number_at, BITS_PER_SEG, WORDS_PER_SEG},
    template::{self, SEG0_ONE_BIT, SEG0_TEMPLATE_PRIME_BITS},
};

/// Sieve all segments in `[seg_from, seg_to)` in place.
///
/// `words` must cover at least `seg_to` segments. Proceeds in waves: each
/// wave only sieves segments whose square root stays below the bound already
/// computed, so every sieving prime is discoverable by scanning the computed
/// prefix. For any bound reachable in practice a single wave suffices (the
/// first segment alone discovers primes covering bounds beyond 2.6·10¹¹).
pub(crate) fn compute_range(words: &mut [u64], seg_from: usize, seg_to: usize, threads: usize) {
    debug_assert!(seg_from < seg_to);
    debug_assert!(words.len() >= seg_to * WORDS_PER_SEG);

    let mut seg_from = seg_from;
    if seg_from == 0 {
        sieve_first_segment(&mut words[..WORDS_PER_SEG]);
        seg_from = 1;
    }

    while seg_from < seg_to {
        let bound = 2 * BITS_PER_SEG * seg_from as u64 - 1;
        let wave_end = match bound.checked_mul(bound) {
            Some(sq) => seg_to.min((sq / (2 * BITS_PER_SEG)) as usize + 1),
            None => seg_to,
        };

        let hi = 2 * BITS_PER_SEG * wave_end as u64 - 1;
        let (computed, fresh) = words.split_at_mut(seg_from * WORDS_PER_SEG);
        let primes = collect_sieving_primes(computed, hi.isqrt());
        let fresh = &mut fresh[..(wave_end - seg_from) * WORDS_PER_SEG];

        let seg_count = wave_end - seg_from;
        let workers = threads.clamp(1, seg_count);
        if workers == 1 {
            sieve_segments(fresh, seg_from, &primes);
        } else {
            let chunk_segs = seg_count.div_ceil(workers);
            thread::scope(|scope| {
                for (i, chunk) in fresh.chunks_mut(chunk_segs * WORDS_PER_SEG).enumerate() {
                    let primes = &primes;
                    let first_seg = seg_from + i * chunk_segs;
                    scope.spawn(move || sieve_segments(chunk, first_seg, primes));
                }
            });
        }

        seg_from = wave_end;
    }
}

/// Sieve segment 0 in place, discovering its own sieving primes.
///
/// The template strikes the multiples of {3..17}; every remaining composite
/// below 2B has an odd prime factor p with 19 <= p <= isqrt(2B - 1), and by
/// the time the scan reaches p all smaller primes have already struck their
/// multiples, so a clear bit identifies p as prime.
fn sieve_first_segment(seg: &mut [u64]) {
    seg.copy_from_slice(template::words());
    seg[0] |= SEG0_ONE_BIT;
    seg[0] &= !SEG0_TEMPLATE_PRIME_BITS;

    let hi = 2 * BITS_PER_SEG - 1;
    let mut k = 9; // bit of 19, the first prime the template does not strike
    loop {
        let p = 2 * k + 1;
        if p * p > hi {
            break;
        }
        if seg[(k >> 6) as usize] >> (k & 63) & 1 == 0 {
            let mut m = p * p;
            while m <= hi {
                let km = m >> 1;
                seg[(km >> 6) as usize] |= 1 << (km & 63);
                m += 2 * p;
            }
        }
        k += 1;
    }
}

/// Collect the odd sieving primes `19 <= p <= limit` by bit-scanning the
/// computed prefix of the bitmap.
fn collect_sieving_primes(computed: &[u64], limit: u64) -> Vec<u64> {
    // pi(n) ~ n/ln(n); 15% slack avoids a late regrow.
    let cap = if limit < 19 {
        0
    } else {
        (limit as f64 / (limit as f64).ln() * 1.15) as usize + 1
    };
    let mut primes = Vec::with_capacity(cap);
    if limit < 19 {
        return primes;
    }

    let mut word_idx = 0;
    let mut word = !computed[0] & (!0u64 << 9);
    loop {
        while word == 0 {
            word_idx += 1;
            if word_idx >= computed.len() {
                return primes;
            }
            word = !computed[word_idx];
        }
        let bit = word.trailing_zeros() as u64;
        word &= word - 1;
        let p = number_at(word_idx, bit);
        if p > limit {
            return primes;
        }
        primes.push(p);
    }
}

/// Sieve a run of whole segments starting at index `first_seg` (>= 1).
fn sieve_segments(chunk: &mut [u64], first_seg: usize, primes: &[u64]) {
    let template = template::words();
    for (li, seg) in chunk.chunks_mut(WORDS_PER_SEG).enumerate() {
        let s = (first_seg + li) as u64;
        seg.copy_from_slice(template);

        let lo = 2 * BITS_PER_SEG * s + 1;
        let hi = 2 * BITS_PER_SEG * (s + 1) - 1;
        let k_base = BITS_PER_SEG * s;

        for &p in primes {
            if p * p > hi {
                break;
            }
            // Smallest odd multiple of p at or above max(p², lo). A prime
            // stride of 2p then skips the even multiples.
            let r = fast_rem(lo, p);
            let mut m = if r == 0 { lo } else { lo + (p - r) };
            if m < p * p {
                m = p * p;
            }
            if m & 1 == 0 {
                m += p;
            }
            while m <= hi {
                let k = (m >> 1) - k_base;
                seg[(k >> 6) as usize] |= 1 << (k & 63);
                m += 2 * p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime_ref(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    fn bit(words: &[u64], n: u64) -> bool {
        let (w, b) = crate::layout::bit_address_of(n);
        words[w] >> b & 1 == 1
    }

    #[test]
    fn first_segment_matches_oracle() {
        let mut words = vec![0u64; WORDS_PER_SEG];
        compute_range(&mut words, 0, 1, 1);
        for n in (1u64..2 * BITS_PER_SEG).step_by(2) {
            assert_eq!(
                bit(&words, n),
                !is_prime_ref(n),
                "wrong compositeness bit for {n}"
            );
        }
    }

    #[test]
    fn later_segments_match_oracle_at_seams() {
        let mut words = vec![0u64; 3 * WORDS_PER_SEG];
        compute_range(&mut words, 0, 3, 2);
        for seam in [2 * BITS_PER_SEG, 4 * BITS_PER_SEG] {
            for n in (seam - 999..seam + 1000).step_by(2) {
                assert_eq!(
                    bit(&words, n),
                    !is_prime_ref(n),
                    "wrong compositeness bit for {n}"
                );
            }
        }
    }

    #[test]
    fn incremental_equals_single_shot() {
        let mut incremental = vec![0u64; 4 * WORDS_PER_SEG];
        compute_range(&mut incremental, 0, 1, 1);
        compute_range(&mut incremental, 1, 2, 1);
        compute_range(&mut incremental, 2, 4, 1);

        let mut single = vec![0u64; 4 * WORDS_PER_SEG];
        compute_range(&mut single, 0, 4, 1);

        assert_eq!(incremental, single);
    }

    #[test]
    fn worker_count_does_not_change_bits() {
        let mut reference = vec![0u64; 6 * WORDS_PER_SEG];
        compute_range(&mut reference, 0, 6, 1);
        for threads in [2, 3, 8, 32] {
            let mut words = vec![0u64; 6 * WORDS_PER_SEG];
            compute_range(&mut words, 0, 6, threads);
            assert_eq!(words, reference, "threads = {threads}");
        }
    }

    #[test]
    fn sieving_prime_collection() {
        let mut words = vec![0u64; WORDS_PER_SEG];
        compute_range(&mut words, 0, 1, 1);
        let primes = collect_sieving_primes(&words, 100);
        assert_eq!(
            primes,
            vec![19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97]
        );
        assert!(collect_sieving_primes(&words, 18).is_empty());
    }
}
