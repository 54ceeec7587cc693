//! Exact trial-division factorization and the Ω_R structural metric.
//!
//! Ω_R(n) strips the largest power of two from an odd `n` and counts the prime
//! factors (with multiplicity) of what is left. Everything is computed on
//! `BigUint`, so the large intermediate values of a Collatz trajectory never
//! overflow.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use std::fmt;

/// Prime factors of `n` in non-decreasing order, with multiplicity.
///
/// Factors of two are stripped first, then odd divisors `d` are tried while
/// `d * d` does not exceed the unfactored cofactor. A cofactor above 1 left
/// over at the end is the largest prime factor. Returns an empty list for
/// `n <= 1`.
pub fn prime_factors(n: &BigUint) -> Vec<BigUint> {
    let mut factors = Vec::new();
    if *n <= BigUint::one() {
        return factors;
    }

    let mut remaining = n.clone();
    let twos = remaining.trailing_zeros().unwrap_or(0);
    if twos > 0 {
        factors.extend(std::iter::repeat(BigUint::from(2u32)).take(twos as usize));
        remaining >>= twos;
    }

    let mut divisor = BigUint::from(3u32);
    while &divisor * &divisor <= remaining {
        // Once the cofactor fits in a machine word, finish natively.
        if let (Some(m), Some(d)) = (remaining.to_u64(), divisor.to_u64()) {
            odd_trial_division_u64(m, d, &mut factors);
            return factors;
        }
        while (&remaining % &divisor).is_zero() {
            factors.push(divisor.clone());
            remaining /= &divisor;
        }
        divisor += 2u32;
    }

    if remaining > BigUint::one() {
        factors.push(remaining);
    }

    factors
}

/// Odd trial division of `m` starting at the odd divisor `divisor`.
///
/// `divisor <= m / divisor` is the overflow-free form of `divisor² <= m`.
fn odd_trial_division_u64(mut m: u64, mut divisor: u64, factors: &mut Vec<BigUint>) {
    while divisor <= m / divisor {
        while m % divisor == 0 {
            factors.push(BigUint::from(divisor));
            m /= divisor;
        }
        divisor += 2;
    }
    if m > 1 {
        factors.push(BigUint::from(m));
    }
}

/// Largest power of two not exceeding `n`, i.e. `2^(bits(n) - 1)`.
///
/// Derived from the bit length, never from a floating-point logarithm.
/// Returns 0 for `n == 0`.
pub fn largest_power_of_two(n: &BigUint) -> BigUint {
    if n.is_zero() {
        return BigUint::zero();
    }
    BigUint::one() << (n.bits() - 1)
}

/// Ω_R(n): number of prime factors of `n - largest_power_of_two(n)`.
///
/// Zero for even `n`, for `n <= 1`, and whenever the remainder is at most 1.
/// Zero is an ordinary value here, not an error marker.
pub fn omega_r(n: &BigUint) -> u32 {
    if *n <= BigUint::one() || n.is_even() {
        return 0;
    }
    let remainder = n - largest_power_of_two(n);
    if remainder <= BigUint::one() {
        return 0;
    }
    prime_factors(&remainder).len() as u32
}

/// The pieces Ω_R is derived from: `n = power_of_two + remainder`, plus the
/// factorization of the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmegaDecomposition {
    pub n: BigUint,
    /// Largest power of two `<= n`
    pub power_of_two: BigUint,
    /// `n - power_of_two`
    pub remainder: BigUint,
    /// Prime factors of the remainder; empty unless `n` is odd and the remainder exceeds 1
    pub remainder_factors: Vec<BigUint>,
    /// Ω_R(n)
    pub omega: u32,
}

impl OmegaDecomposition {
    /// Decompose `n`. The factorizer only runs for odd `n` with a remainder above 1.
    pub fn of(n: &BigUint) -> Self {
        let power_of_two = largest_power_of_two(n);
        let remainder = n - &power_of_two;
        let remainder_factors = if n.is_odd() && remainder > BigUint::one() {
            prime_factors(&remainder)
        } else {
            Vec::new()
        };
        let omega = remainder_factors.len() as u32;

        OmegaDecomposition {
            n: n.clone(),
            power_of_two,
            remainder,
            remainder_factors,
            omega,
        }
    }
}

impl fmt::Display for OmegaDecomposition {
    /// Renders `n = p + f`, `n = p + (f1 × f2 × ...)`, or `n = p + r` when the
    /// remainder was not factored.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} + ", self.n, self.power_of_two)?;
        match self.remainder_factors.as_slice() {
            [] => write!(f, "{}", self.remainder),
            [single] => write!(f, "{}", single),
            many => {
                let joined: Vec<String> = many.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", joined.join(" × "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn is_prime(p: &BigUint) -> bool {
        let p = p.to_u64().expect("test primes fit in u64");
        if p < 2 {
            return false;
        }
        let mut d = 2u64;
        while d <= p / d {
            if p % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }

    fn check_factorization(n: &BigUint) {
        let factors = prime_factors(n);
        let product = factors.iter().fold(BigUint::one(), |acc, f| acc * f);
        assert_eq!(&product, n, "product of factors of {} is {}", n, product);
        assert!(
            factors.windows(2).all(|w| w[0] <= w[1]),
            "factors of {} are not sorted: {:?}",
            n,
            factors
        );
    }

    #[test]
    fn test_prime_factors_small() {
        assert!(prime_factors(&big(1)).is_empty());
        assert!(prime_factors(&big(0)).is_empty());
        assert_eq!(prime_factors(&big(2)), vec![big(2)]);
        assert_eq!(prime_factors(&big(3)), vec![big(3)]);
        assert_eq!(prime_factors(&big(12)), vec![big(2), big(2), big(3)]);
        assert_eq!(prime_factors(&big(63)), vec![big(3), big(3), big(7)]);
        assert_eq!(prime_factors(&big(97)), vec![big(97)]);
        assert_eq!(prime_factors(&big(1001)), vec![big(7), big(11), big(13)]);
    }

    #[test]
    fn test_prime_factors_product_and_primality() {
        for n in 1..=5000u64 {
            let n = big(n);
            check_factorization(&n);
            for p in prime_factors(&n) {
                assert!(is_prime(&p), "{} is not prime (factor of {})", p, n);
            }
        }
    }

    #[test]
    fn test_prime_factors_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let n = big(rng.gen_range(1..50_000_000u64));
            check_factorization(&n);
        }
    }

    #[test]
    fn test_prime_factors_beyond_u64() {
        // 2^64 + 1 = 274177 × 67280421310721
        let n = (BigUint::one() << 64u32) + 1u32;
        assert_eq!(prime_factors(&n), vec![big(274177), big(67280421310721)]);

        let n = BigUint::one() << 70u32;
        let factors = prime_factors(&n);
        assert_eq!(factors.len(), 70);
        assert!(factors.iter().all(|f| *f == big(2)));

        let n = BigUint::from(3u32).pow(45);
        let factors = prime_factors(&n);
        assert_eq!(factors.len(), 45);
        check_factorization(&n);
    }

    #[test]
    fn test_largest_power_of_two() {
        assert_eq!(largest_power_of_two(&big(0)), big(0));
        assert_eq!(largest_power_of_two(&big(1)), big(1));
        assert_eq!(largest_power_of_two(&big(7)), big(4));
        assert_eq!(largest_power_of_two(&big(8)), big(8));
        assert_eq!(largest_power_of_two(&big(9)), big(8));

        let n = (BigUint::one() << 200u32) + 12345u32;
        assert_eq!(largest_power_of_two(&n), BigUint::one() << 200u32);
    }

    #[test]
    fn test_omega_r_reference_values() {
        // 7 = 4 + 3
        assert_eq!(omega_r(&big(7)), 1);
        // 9 = 8 + 1
        assert_eq!(omega_r(&big(9)), 0);
        // 59 = 32 + 27 = 32 + 3^3
        assert_eq!(omega_r(&big(59)), 3);
        // 127 = 64 + 63 = 64 + 3 × 3 × 7
        assert_eq!(omega_r(&big(127)), 3);
        // 3 = 2 + 1
        assert_eq!(omega_r(&big(3)), 0);
    }

    #[test]
    fn test_omega_r_zero_cases() {
        assert_eq!(omega_r(&big(0)), 0);
        assert_eq!(omega_r(&big(1)), 0);
        for n in (2..2000u64).step_by(2) {
            assert_eq!(omega_r(&big(n)), 0, "even {} must have Ω_R = 0", n);
        }
    }

    #[test]
    fn test_omega_r_matches_remainder_factor_count() {
        for n in (3..5000u64).step_by(2) {
            let p = 1u64 << (63 - n.leading_zeros());
            let r = n - p;
            let expected = if r > 1 { prime_factors(&big(r)).len() as u32 } else { 0 };
            assert_eq!(omega_r(&big(n)), expected, "Ω_R({})", n);
            assert_eq!(OmegaDecomposition::of(&big(n)).omega, expected);
        }
    }

    #[test]
    fn test_omega_r_large() {
        // 2^80 + 15: remainder 15 = 3 × 5
        let n = (BigUint::one() << 80u32) + 15u32;
        assert_eq!(omega_r(&n), 2);
    }

    #[test]
    fn test_decomposition_display() {
        assert_eq!(OmegaDecomposition::of(&big(7)).to_string(), "7 = 4 + 3");
        assert_eq!(OmegaDecomposition::of(&big(9)).to_string(), "9 = 8 + 1");
        assert_eq!(
            OmegaDecomposition::of(&big(127)).to_string(),
            "127 = 64 + (3 × 3 × 7)"
        );
        assert_eq!(OmegaDecomposition::of(&big(1)).to_string(), "1 = 1 + 0");
    }

    #[test]
    fn test_decomposition_even_skips_factoring() {
        let d = OmegaDecomposition::of(&big(40));
        assert_eq!(d.power_of_two, big(32));
        assert_eq!(d.remainder, big(8));
        assert!(d.remainder_factors.is_empty());
        assert_eq!(d.omega, 0);
    }
}
