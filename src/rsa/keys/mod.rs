pub mod identity;
pub mod key_writer;
pub mod key_reader;
pub mod key_pair;

pub use identity::*;
pub use key_reader::*;
pub use key_writer::*;

use std::io;
use std::path::PathBuf;
use num_bigint::BigUint;
use thiserror::Error;
use crate::rsa::prime_gen::{pow_mod, MathError};

/// Public half: modulus, public exponent and the owner's signed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub e: BigUint,
    pub signature: BigUint,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub n: BigUint,
    pub d: BigUint,
}

#[derive(Debug, Clone)]
pub struct KeySet {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        pow_mod(m, &self.e, &self.n)
    }

    pub fn verify(&self, message: &BigUint, signature: &BigUint) -> bool {
        pow_mod(signature, &self.e, &self.n) == *message
    }

    /// Checks the stored signature against the owner identity.
    pub fn verify_owner(&self) -> Result<bool, KeyError> {
        let message = encode_identity(&self.owner)?;
        Ok(self.verify(&message, &self.signature))
    }

    /// The identity the stored signature opens to under this key.
    pub fn signed_identity(&self) -> String {
        decode_identity(&self.encrypt(&self.signature))
    }
}

impl PrivateKey {
    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        pow_mod(c, &self.d, &self.n)
    }

    pub fn sign(&self, message: &BigUint) -> BigUint {
        pow_mod(message, &self.d, &self.n)
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("cannot access key file `{}': {source}", path.display())]
    File { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("key file has no {0} line")]
    MissingField(&'static str),

    #[error("key field {field} is not a hex number: `{text}'")]
    BadHex { field: &'static str, text: String },

    #[error("key modulus must be greater than 1")]
    BadModulus,

    #[error("identity is empty")]
    EmptyIdentity,

    #[error("identity `{identity}' contains `{ch}', only 0-9, a-z and A-Z are allowed")]
    BadIdentity { identity: String, ch: char },

    #[error("identity `{0}' does not fit below the key modulus")]
    IdentityTooLarge(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use crate::rsa::keys::{encode_identity, KeyError, PrivateKey, PublicKey};

    // p = 61, q = 53, lambda = 780, e = 17, d = 413
    fn toy_keys(owner: &str) -> (PublicKey, PrivateKey) {
        let (n, e, d) = (BigUint::from(3233u32), BigUint::from(17u32), BigUint::from(413u32));
        let private = PrivateKey { n: n.clone(), d };
        let message = encode_identity(owner).unwrap();
        let signature = private.sign(&message);
        (PublicKey { n, e, signature, owner: owner.to_string() }, private)
    }

    #[test]
    fn test_simple_data() {
        let (public, private) = toy_keys("bo");
        for m in [0u32, 1, 2, 88, 1000, 3232] {
            let m = BigUint::from(m);
            let c = public.encrypt(&m);
            assert_eq!(private.decrypt(&c), m);
        }
        assert_eq!(public.encrypt(&BigUint::from(65u32)), BigUint::from(2790u32));
    }

    #[test]
    fn signature_round_trip() -> Result<(), KeyError> {
        let (public, _) = toy_keys("bo");
        assert!(public.verify_owner()?);
        let message = encode_identity("bo")?;
        assert!(public.verify(&message, &public.signature));
        assert_eq!(public.signed_identity(), "bo");
        Ok(())
    }

    #[test]
    fn altered_signature_fails() -> Result<(), KeyError> {
        let (public, _) = toy_keys("bo");
        let message = encode_identity("bo")?;

        let mut forged = public.clone();
        forged.signature += 1u32;
        assert!(!forged.verify_owner()?);

        let mut forged = public.clone();
        forged.e = BigUint::from(19u32);
        assert!(!forged.verify(&message, &forged.signature));

        let mut forged = public.clone();
        forged.n = BigUint::from(3127u32);
        assert!(!forged.verify(&message, &forged.signature));

        let mut forged = public;
        forged.owner = "ab".to_string();
        assert!(!forged.verify_owner()?);
        assert_eq!(forged.signed_identity(), "bo");
        Ok(())
    }
}
