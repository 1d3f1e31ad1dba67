//! A dynamically growing prime sieve with constant-time primality queries
//! and bidirectional prime iteration.
//!
//! This crate provides [`PrimeSieve`], an odd-only, bit-packed segmented
//! sieve of Eratosthenes that extends itself on demand. Create a sieve,
//! optionally pre-compute up to a bound, and query away: any query whose
//! argument exceeds the computed bound transparently grows the sieve first.
//!
//! # Features
//!
//! - **O(1) primality queries** within the computed bound
//! - **Transparent growth**: queries and iterators extend the sieve as
//!   needed
//! - **Multithreaded computation**: new segments are sieved in parallel
//! - **Bidirectional iteration**: ascending from 2 or any start, descending
//!   from any start down to 2
//! - **Compact storage**: one bit per odd number, ~n/16 bytes up to n
//! - **Serialization support** via serde (optional)
//!
//! # Examples
//!
//! ```
//! use segsieve::PrimeSieve;
//!
//! let mut sieve = PrimeSieve::new();
//!
//! // Point queries
//! assert!(sieve.is_prime(104_729));
//! assert_eq!(sieve.next_prime(100), 101);
//! assert_eq!(sieve.prev_prime(100), 97);
//!
//! // Ascending iteration from an arbitrary start
//! let twins: Vec<u64> = sieve
//!     .primes_from(100)
//!     .take(20)
//!     .collect::<Vec<_>>()
//!     .windows(2)
//!     .filter(|w| w[1] - w[0] == 2)
//!     .map(|w| w[0])
//!     .collect();
//! assert_eq!(twins[0], 101);
//!
//! // Descending iteration always ends with 2
//! let down: Vec<u64> = sieve.primes_back_from(10).collect();
//! assert_eq!(down, [7, 5, 3, 2]);
//! ```
//!
//! # Storage strategy
//!
//! The bitmap skips even numbers entirely (2 is special-cased) and packs
//! odd numbers into segments of 255255 bits — the product of
//! {3, 5, 7, 11, 13, 17} — so the combined multiples of those primes form a
//! fixed template that tiles every segment exactly and is applied with a
//! single copy. Remaining odd-prime multiples are crossed off per segment,
//! and segments are distributed across worker threads.
//!
//! # Performance
//!
//! - `is_prime` is a single bit test after growth
//! - `next_prime` / `prev_prime` scan words with trailing/leading-zero
//!   counts, skipping 64 candidates at a time through composite runs
//! - Growth cost is amortized: allocation doubles, and each segment is
//!   sieved exactly once

#![warn(missing_docs)]

mod compute;
mod iter;
mod layout;
mod sieve;
mod storage;
mod template;

#[cfg(feature = "serde")]
pub mod serde;

pub use iter::{Primes, PrimesRev};
pub use sieve::PrimeSieve;
pub use storage::OutOfMemory;
