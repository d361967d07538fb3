//! Owner identities as base-62 numerals.
//!
//! A user name such as `alice` is read as a number in base 62, digits
//! `0-9` first, then `a-z`, then `A-Z`. The resulting integer is what gets
//! signed at key generation and re-derived when a public key is checked.
//! It is a compact encoding only, not a hash: no collision resistance, and
//! leading `0` digits do not survive a round trip.

use num_bigint::BigUint;
use num_traits::Zero;
use crate::rsa::keys::KeyError;

const BASE: u32 = 62;
const DIGITS: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn digit_value(ch: char) -> Option<u32> {
    match ch {
        '0'..='9' => Some(ch as u32 - '0' as u32),
        'a'..='z' => Some(ch as u32 - 'a' as u32 + 10),
        'A'..='Z' => Some(ch as u32 - 'A' as u32 + 36),
        _ => None,
    }
}

pub fn encode_identity(identity: &str) -> Result<BigUint, KeyError> {
    if identity.is_empty() { return Err(KeyError::EmptyIdentity); }
    identity.chars().try_fold(BigUint::zero(), |acc, ch| match digit_value(ch) {
        Some(v) => Ok(acc * BASE + v),
        None => Err(KeyError::BadIdentity { identity: identity.to_string(), ch }),
    })
}

pub fn decode_identity(value: &BigUint) -> String {
    if value.is_zero() { return "0".to_string(); }
    value.to_radix_be(BASE).iter().map(|&d| DIGITS[d as usize] as char).collect()
}
