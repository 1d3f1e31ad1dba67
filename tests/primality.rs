use segsieve::PrimeSieve;

/// Trial-division reference oracle.
fn is_prime_ref(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

const SEG_SPAN: u64 = 2 * 255_255; // odd numbers covered by one segment

#[test]
fn small_values() {
    let mut sieve = PrimeSieve::new();
    assert!(!sieve.is_prime(0));
    assert!(!sieve.is_prime(1));
    assert!(sieve.is_prime(2));
    assert!(sieve.is_prime(3));
    assert!(!sieve.is_prime(4));
    assert!(sieve.is_prime(127));
    assert!(!sieve.is_prime(128));
}

#[test]
fn agrees_with_oracle_up_to_3000() {
    let mut sieve = PrimeSieve::new();
    for n in 0..=3000 {
        assert_eq!(sieve.is_prime(n), is_prime_ref(n), "mismatch at {n}");
    }
}

#[test]
fn agrees_with_oracle_across_segment_seam() {
    let mut sieve = PrimeSieve::new();
    for n in SEG_SPAN - 500..=SEG_SPAN + 500 {
        assert_eq!(sieve.is_prime(n), is_prime_ref(n), "mismatch at {n}");
    }
}

#[test]
fn segment_seam_spot_values() {
    let mut sieve = PrimeSieve::new();
    // 510509 = 61 · 8369 and 510511 = 19 · 26869; the even seam value is
    // trivially composite.
    assert!(!sieve.is_prime(SEG_SPAN - 1));
    assert!(!sieve.is_prime(SEG_SPAN));
    assert!(!sieve.is_prime(SEG_SPAN + 1));
}

#[test]
fn next_prime_examples() {
    let mut sieve = PrimeSieve::new();
    assert_eq!(sieve.next_prime(0), 2);
    assert_eq!(sieve.next_prime(1), 2);
    assert_eq!(sieve.next_prime(2), 3);
    assert_eq!(sieve.next_prime(127), 131);
    assert_eq!(sieve.next_prime(131), 137);
}

#[test]
fn prev_prime_examples() {
    let mut sieve = PrimeSieve::new();
    assert_eq!(sieve.prev_prime(127), 113);
    assert_eq!(sieve.prev_prime(3), 2);
    assert_eq!(sieve.prev_prime(4), 3);
}

#[test]
#[should_panic(expected = "prev_prime requires x > 2")]
fn prev_prime_rejects_two() {
    let mut sieve = PrimeSieve::new();
    let _ = sieve.prev_prime(2);
}

#[test]
fn next_and_prev_agree_with_oracle() {
    let mut sieve = PrimeSieve::new();
    for n in 0u64..2000 {
        let p = sieve.next_prime(n);
        assert!(p > n && is_prime_ref(p));
        assert!((n + 1..p).all(|m| !is_prime_ref(m)), "skipped a prime after {n}");
    }
    for n in 3u64..2000 {
        let p = sieve.prev_prime(n);
        assert!(p < n && is_prime_ref(p));
        assert!((p + 1..n).all(|m| !is_prime_ref(m)), "skipped a prime below {n}");
    }
}

#[test]
fn prime_count_to_one_million() {
    let mut sieve = PrimeSieve::computed_to(1_000_000);
    let count = sieve.primes().take_while(|&p| p <= 1_000_000).count();
    assert_eq!(count, 78_498);
}

#[test]
fn prime_count_to_ten_million() {
    let mut sieve = PrimeSieve::computed_to(10_000_000);
    let count = sieve.primes().take_while(|&p| p <= 10_000_000).count();
    assert_eq!(count, 664_579);
}

#[test]
#[ignore = "allocates a 256 MiB sieve"]
fn agrees_with_oracle_around_two_pow_32() {
    let mut sieve = PrimeSieve::new();
    let base = 1u64 << 32;
    assert!(!sieve.is_prime(base));
    // 2^32 + 1 = 641 · 6700417
    assert!(!sieve.is_prime(base + 1));
    for n in base - 200..=base + 200 {
        assert_eq!(sieve.is_prime(n), is_prime_ref(n), "mismatch at {n}");
    }
}
