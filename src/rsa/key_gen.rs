use num_bigint::BigUint;
use num_traits::One;
use crate::rsa::euclid::{gcd, lcm, mod_inverse};
use crate::rsa::keys::{encode_identity, KeyError, KeySet, PrivateKey, PublicKey};
use crate::rsa::prime_gen::{make_prime, MathError};
use crate::rsa::rand_state::RandState;

/// Smallest modulus budget that still leaves room for one payload byte per
/// block.
pub const MIN_KEY_BITS: u64 = 16;

#[derive(Debug, Clone)]
pub struct Factors {
    pub p: BigUint,
    pub q: BigUint,
}

impl Factors {
    pub fn modulus(&self) -> BigUint {
        &self.p * &self.q
    }

    /// lambda(n) = lcm(p - 1, q - 1)
    pub fn carmichael(&self) -> BigUint {
        lcm(&(&self.p - 1u32), &(&self.q - 1u32))
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub keys: KeySet,
    pub factors: Factors,
}

/// Two primes whose bit budgets add up to `nbits`, split at a random point
/// in `[nbits/4, 3*nbits/4]`.
pub fn make_factors(nbits: u64, iters: u32, state: &mut RandState) -> Result<Factors, MathError> {
    if nbits < MIN_KEY_BITS {
        return Err(MathError::KeyTooSmall { bits: nbits, min: MIN_KEY_BITS });
    }
    let numbits = state.range_u64(nbits / 4, 3 * nbits / 4);
    let p = make_prime(numbits, iters, state)?;
    let mut q = make_prime(nbits - numbits, iters, state)?;
    // p = q makes n a square, where lcm(p - 1, q - 1) is not λ(n) and decryption breaks
    while q == p {
        q = make_prime(nbits - numbits, iters, state)?;
    }
    log::debug!("split {} bits into p: {} bits, q: {} bits", nbits, p.bits(), q.bits());
    Ok(Factors { p, q })
}

/// Random `nbits`-bit public exponent coprime to `lambda`.
pub fn make_exponent(nbits: u64, lambda: &BigUint, state: &mut RandState) -> BigUint {
    loop {
        let e = state.bits(nbits);
        if e > BigUint::one() && gcd(&e, lambda).is_one() { return e; }
    }
}

pub fn generate_key(nbits: u64, iters: u32, owner: &str, state: &mut RandState) -> Result<GeneratedKey, KeyError> {
    let message = encode_identity(owner)?;
    let factors = make_factors(nbits, iters, state)?;
    let n = factors.modulus();
    if message >= n {
        return Err(KeyError::IdentityTooLarge(owner.to_string()));
    }
    let lambda = factors.carmichael();
    let e = make_exponent(nbits, &lambda, state);
    let d = mod_inverse(&e, &lambda)?;
    let private = PrivateKey { n: n.clone(), d };
    let signature = private.sign(&message);
    let public = PublicKey { n, e, signature, owner: owner.to_string() };
    log::info!("generated {}-bit key for `{}'", public.n.bits(), owner);
    Ok(GeneratedKey { keys: KeySet { public, private }, factors })
}
