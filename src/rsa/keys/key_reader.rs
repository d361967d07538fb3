use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::Path;
use std::str::FromStr;
use num_bigint::BigUint;
use num_traits::One;
use crate::rsa::keys::{encode_identity, KeyError, PrivateKey, PublicKey};

/// Strict hex: `parse_bytes` alone would take `_` separators and a leading `+`.
pub fn parse_hex(text: &str) -> Option<BigUint> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) { return None; }
    BigUint::parse_bytes(text.as_bytes(), 16)
}

/// Pulls the line-oriented fields of a key file one at a time.
pub struct KeyReader<R: BufRead> {
    lines: Lines<R>,
}

impl<R: BufRead> KeyReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    pub fn next_line(&mut self, field: &'static str) -> Result<String, KeyError> {
        match self.lines.next() {
            Some(line) => {
                let line = line?;
                Ok(line.trim_end_matches('\r').to_string())
            }
            None => Err(KeyError::MissingField(field)),
        }
    }

    pub fn next_hex(&mut self, field: &'static str) -> Result<BigUint, KeyError> {
        let line = self.next_line(field)?;
        let text = line.trim();
        if text.is_empty() { return Err(KeyError::MissingField(field)); }
        parse_hex(text).ok_or_else(|| KeyError::BadHex { field, text: text.to_string() })
    }

    fn next_modulus(&mut self) -> Result<BigUint, KeyError> {
        let n = self.next_hex("n")?;
        if n <= BigUint::one() { return Err(KeyError::BadModulus); }
        Ok(n)
    }

    pub fn read_public(&mut self) -> Result<PublicKey, KeyError> {
        let n = self.next_modulus()?;
        let e = self.next_hex("e")?;
        let signature = self.next_hex("signature")?;
        let owner = self.next_line("owner")?;
        encode_identity(&owner)?;
        Ok(PublicKey { n, e, signature, owner })
    }

    pub fn read_private(&mut self) -> Result<PrivateKey, KeyError> {
        let n = self.next_modulus()?;
        let d = self.next_hex("d")?;
        Ok(PrivateKey { n, d })
    }
}

fn open(path: &Path) -> Result<KeyReader<BufReader<File>>, KeyError> {
    let file = File::open(path).map_err(|source| KeyError::File { path: path.to_path_buf(), source })?;
    Ok(KeyReader::new(BufReader::new(file)))
}

impl PublicKey {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KeyError> {
        open(path.as_ref())?.read_public()
    }
}

impl PrivateKey {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KeyError> {
        open(path.as_ref())?.read_private()
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyReader::new(Cursor::new(s)).read_public()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyReader::new(Cursor::new(s)).read_private()
    }
}
