use std::path::Path;
use crate::rsa::keys::{KeyError, KeySet, PrivateKey, PublicKey};

impl KeySet {
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(&self, public_path: P, private_path: Q) -> Result<(), KeyError> {
        self.public.save(public_path)?;
        self.private.save(private_path)
    }

    /// Loads both halves independently; nothing ties them together until
    /// [`KeySet::is_matched`] is asked.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(public_path: P, private_path: Q) -> Result<Self, KeyError> {
        Ok(Self { public: PublicKey::load(public_path)?, private: PrivateKey::load(private_path)? })
    }

    pub fn is_matched(&self) -> bool {
        self.public.n == self.private.n
    }
}
