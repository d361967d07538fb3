use num::Integer;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};
use crate::rsa::prime_gen::MathError;

pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    let d = gcd(a, b);
    if d.is_zero() { return BigUint::zero(); }
    (a * b) / d
}

/// Inverse of `a` modulo `n` by the extended Euclidean algorithm, in `[0, n)`.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint, MathError> {
    if n.is_zero() { return Err(MathError::ZeroModulus); }
    let modulus = BigInt::from_biguint(Sign::Plus, n.clone());
    let (mut r, mut r1) = (modulus.clone(), BigInt::from_biguint(Sign::Plus, a.clone()));
    let (mut t, mut t1) = (BigInt::zero(), BigInt::one());
    while !r1.is_zero() {
        let q = r.div_floor(&r1);
        let next_r = &r - &q * &r1;
        r = std::mem::replace(&mut r1, next_r);
        let next_t = &t - &q * &t1;
        t = std::mem::replace(&mut t1, next_t);
    }
    if r > BigInt::one() {
        return Err(MathError::NoInverse { a: a.clone(), n: n.clone() });
    }
    if t.is_negative() { t += &modulus; }
    // n = 1 leaves t = 1, which still has to be reduced into [0, n)
    Ok(t.mod_floor(&modulus).magnitude().clone())
}
