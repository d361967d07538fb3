use chrono::Local;
use num::Integer;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use thiserror::Error;
use crate::rsa::rand_state::RandState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("{a} has no inverse modulo {n}")]
    NoInverse { a: BigUint, n: BigUint },

    #[error("modulus must not be zero")]
    ZeroModulus,

    #[error("cannot generate a prime with {0} bits")]
    TooFewBits(u64),

    #[error("key size {bits} is below the minimum of {min} bits")]
    KeyTooSmall { bits: u64, min: u64 },
}

/// Right-to-left binary exponentiation, `base^exponent mod modulus`.
pub fn pow_mod(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    let mut r = BigUint::one() % modulus;
    let mut a = base % modulus;
    let mut q = exponent.clone();
    while !q.is_zero() {
        if q.bit(0) { r = (r * &a) % modulus; }
        a = (&a * &a) % modulus;
        q >>= 1;
    }
    r
}

/// Miller-Rabin with `iters` random witnesses. Never rejects a prime, accepts
/// a composite with probability at most `4^-iters`.
pub fn is_prime(n: &BigUint, iters: u32, state: &mut RandState) -> bool {
    let two = BigUint::from(2u32);
    if *n == two || *n == BigUint::from(3u32) { return true; }
    if *n < two || *n == BigUint::from(4u32) || n.is_even() { return false; }

    let n_1 = n - 1u32;
    let mut s = n_1.clone();
    let mut r = 0u64;
    while s.is_even() {
        s >>= 1;
        r += 1;
    }

    for _ in 0..iters {
        let a = state.range(&two, &n_1);
        let mut y = pow_mod(&a, &s, n);
        if y.is_one() || y == n_1 { continue; }
        let mut j = 1;
        while j < r && y != n_1 {
            y = (&y * &y) % n;
            // a nontrivial square root of 1 proves n composite
            if y.is_one() { return false; }
            j += 1;
        }
        if y != n_1 { return false; }
    }
    true
}

/// Random prime in `[2^bits, 2^bits + 2^(bits-1))`, so its bit length is
/// always `bits + 1`.
pub fn make_prime(bits: u64, iters: u32, state: &mut RandState) -> Result<BigUint, MathError> {
    if bits == 0 { return Err(MathError::TooFewBits(bits)); }
    let low = BigUint::one() << bits;
    let start = Local::now().timestamp_millis();
    let mut tries = 0u64;
    loop {
        tries += 1;
        let candidate = state.bits(bits - 1) + &low;
        if is_prime(&candidate, iters, state) {
            log::debug!("Done generation of a {}-bit prime in {} tries after {} ms",
                bits + 1, tries, Local::now().timestamp_millis() - start);
            return Ok(candidate);
        }
    }
}
