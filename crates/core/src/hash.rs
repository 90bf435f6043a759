//! Bucket hashing and prime table sizing
//!
//! The default hasher is Knuth's multiplicative method with the golden ratio
//! conjugate `A = (sqrt(5) - 1) / 2`: the index is `floor(size * frac(v * A))`.
//! [`GoldenRatioHasher`] evaluates it in 64-bit fixed point so the result does
//! not drift with floating-point rounding; [`FloatGoldenRatioHasher`] keeps the
//! textbook floating-point form for comparison.

use crate::key::CpfKey;

/// `A * 2^64` rounded down, with `A = (sqrt(5) - 1) / 2`
pub const GOLDEN_RATIO_FIXED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Maps a normalized key to a bucket index in `[0, size)`.
///
/// Implementations must be pure functions of `(key, size)`: the table relies on
/// that when it rebuilds itself at a larger size.
pub trait KeyHasher {
    fn bucket_index(&self, key: &CpfKey, size: usize) -> usize;
}

impl<F> KeyHasher for F
where
    F: Fn(&CpfKey, usize) -> usize,
{
    fn bucket_index(&self, key: &CpfKey, size: usize) -> usize {
        self(key, size)
    }
}

/// Fixed-point multiplicative hash (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldenRatioHasher;

impl KeyHasher for GoldenRatioHasher {
    fn bucket_index(&self, key: &CpfKey, size: usize) -> usize {
        // frac(v * A) scaled to 2^64, then multiplied by size and shifted back
        let frac = key.value().wrapping_mul(GOLDEN_RATIO_FIXED);
        ((u128::from(frac) * size as u128) >> 64) as usize
    }
}

/// Floating-point multiplicative hash
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatGoldenRatioHasher;

impl KeyHasher for FloatGoldenRatioHasher {
    fn bucket_index(&self, key: &CpfKey, size: usize) -> usize {
        let a = (5f64.sqrt() - 1.0) / 2.0;
        let frac = (key.value() as f64 * a).fract();
        ((size as f64 * frac) as usize).min(size.saturating_sub(1))
    }
}

/// `v mod size`, useful as a baseline when comparing collision counts
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuloHasher;

impl KeyHasher for ModuloHasher {
    fn bucket_index(&self, key: &CpfKey, size: usize) -> usize {
        (key.value() % size as u64) as usize
    }
}

/// Trial division primality test
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest prime `>= n`; anything at or below 1 yields 2
pub fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(v: u64) -> CpfKey {
        CpfKey::parse(&format!("{:011}", v)).unwrap()
    }

    #[test]
    fn test_is_prime() {
        let primes: Vec<usize> = (0..30).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert!(is_prime(1009));
        assert!(is_prime(2027));
        assert!(!is_prime(2021)); // 43 * 47
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(1), 2);
        assert_eq!(next_prime(2), 2);
        assert_eq!(next_prime(14), 17);
        assert_eq!(next_prime(1000), 1009);
        assert_eq!(next_prime(2018), 2027);
        assert_eq!(next_prime(1009), 1009);
    }

    #[test]
    fn test_indices_in_range() {
        let hashers: [&dyn KeyHasher; 3] = [&GoldenRatioHasher, &FloatGoldenRatioHasher, &ModuloHasher];
        for size in [2, 17, 1009, 2027] {
            for v in (0..100_000_000_000u64).step_by(7_919_999_999) {
                for hasher in hashers {
                    assert!(hasher.bucket_index(&key(v), size) < size);
                }
            }
            assert!(GoldenRatioHasher.bucket_index(&key(99_999_999_999), size) < size);
        }
    }

    #[test]
    fn test_deterministic() {
        let k = key(11_144_477_735);
        assert_eq!(
            GoldenRatioHasher.bucket_index(&k, 1009),
            GoldenRatioHasher.bucket_index(&k.clone(), 1009)
        );
    }

    #[test]
    fn test_fixed_point_matches_float_for_small_values() {
        for v in 1..=100 {
            assert_eq!(
                GoldenRatioHasher.bucket_index(&key(v), 1009),
                FloatGoldenRatioHasher.bucket_index(&key(v), 1009),
                "value {v}"
            );
        }
        assert_eq!(GoldenRatioHasher.bucket_index(&key(1), 1009), 623);
    }

    #[test]
    fn test_sequential_keys_spread() {
        let base = 11_144_477_000u64;
        let buckets: HashSet<usize> = (0..1000)
            .map(|i| GoldenRatioHasher.bucket_index(&key(base + i), 1009))
            .collect();

        // Sequential keys should land in most buckets
        assert!(buckets.len() > 600, "only {} buckets used", buckets.len());
    }

    #[test]
    fn test_closure_hasher() {
        let first_digit = |k: &CpfKey, size: usize| (k.value() / 10_000_000_000) as usize % size;
        assert_eq!(first_digit.bucket_index(&key(11_144_477_735), 7), 1);
    }
}
