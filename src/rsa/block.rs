//! Fixed-width block envelope over raw RSA.
//!
//! Plaintext is cut into blocks of `k - 1` bytes, `k = (bits(n) - 1) / 8`.
//! Each block is prefixed with the sentinel `0xFF`, read as a big-endian
//! integer, raised to the public exponent and written as one hex line. The
//! sentinel keeps the block value below `n` and lets the decrypted byte
//! length (minus one) tell how many payload bytes the block carried.

use std::io::{self, BufRead, Read, Write};
use num_bigint::BigUint;
use thiserror::Error;
use crate::rsa::keys::{parse_hex, PrivateKey, PublicKey};

pub const SENTINEL: u8 = 0xFF;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("modulus of {0} bits is too small to carry any payload")]
    ModulusTooSmall(u64),

    #[error("line {line}: `{text}' is not a hex block")]
    BadBlock { line: usize, text: String },

    #[error("line {line}: decrypted block has no sentinel, wrong key or corrupted input")]
    MissingSentinel { line: usize },

    #[error("line {line}: decrypted block holds {len} bytes, at most {max} expected")]
    BlockTooLong { line: usize, len: usize, max: usize },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    pub blocks: usize,
    pub bytes: usize,
}

/// Block capacity `k` in bytes, sentinel included.
pub fn block_size(n: &BigUint) -> Result<usize, CipherError> {
    let k = (n.bits().saturating_sub(1) / 8) as usize;
    if k < 2 { return Err(CipherError::ModulusTooSmall(n.bits())); }
    Ok(k)
}

/// Fills `buf` as far as the reader allows; a short count means end of input.
pub fn read_source(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn encrypt_stream(reader: &mut dyn Read, writer: &mut dyn Write, key: &PublicKey) -> Result<BlockStats, CipherError> {
    let k = block_size(&key.n)?;
    let mut block = vec![0u8; k];
    block[0] = SENTINEL;
    let mut stats = BlockStats::default();
    loop {
        let read = read_source(reader, &mut block[1..])?;
        if read == 0 { break; }
        let m = BigUint::from_bytes_be(&block[..=read]);
        writeln!(writer, "{:x}", key.encrypt(&m))?;
        stats.blocks += 1;
        stats.bytes += read;
        if read < k - 1 { break; }
    }
    writer.flush()?;
    log::debug!("encrypted {} bytes into {} blocks of {} bytes", stats.bytes, stats.blocks, k);
    Ok(stats)
}

pub fn decrypt_stream(reader: &mut dyn BufRead, writer: &mut dyn Write, key: &PrivateKey) -> Result<BlockStats, CipherError> {
    let k = block_size(&key.n)?;
    let mut stats = BlockStats::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() { continue; }
        let c = parse_hex(text)
            .ok_or_else(|| CipherError::BadBlock { line: i + 1, text: text.to_string() })?;
        let block = key.decrypt(&c).to_bytes_be();
        let payload = match block.split_first() {
            Some((&SENTINEL, payload)) => payload,
            _ => return Err(CipherError::MissingSentinel { line: i + 1 }),
        };
        if payload.len() > k - 1 {
            return Err(CipherError::BlockTooLong { line: i + 1, len: payload.len(), max: k - 1 });
        }
        writer.write_all(payload)?;
        stats.blocks += 1;
        stats.bytes += payload.len();
    }
    writer.flush()?;
    log::debug!("decrypted {} blocks into {} bytes", stats.blocks, stats.bytes);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io::Cursor;
    use num_bigint::BigUint;
    use crate::rsa::key_gen::generate_key;
    use crate::rsa::keys::{KeySet, PrivateKey, PublicKey};
    use crate::rsa::rand_state::RandState;
    use super::*;

    fn keys(nbits: u64, seed: u64) -> KeySet {
        generate_key(nbits, 30, "u", &mut RandState::new(seed)).unwrap().keys
    }

    fn round_trip(keys: &KeySet, data: &[u8]) -> Result<(String, Vec<u8>), Box<dyn Error>> {
        let mut cipher = Vec::new();
        encrypt_stream(&mut Cursor::new(data), &mut cipher, &keys.public)?;
        let mut plain = Vec::new();
        decrypt_stream(&mut Cursor::new(&cipher), &mut plain, &keys.private)?;
        Ok((String::from_utf8(cipher)?, plain))
    }

    #[test]
    fn block_size_from_modulus() -> Result<(), CipherError> {
        assert_eq!(block_size(&BigUint::from(0x1_0001u32))?, 2);
        assert_eq!(block_size(&((BigUint::from(1u32) << 256u32) + 1u32))?, 32);
        assert_eq!(block_size(&((BigUint::from(1u32) << 255u32) + 1u32))?, 31);
        assert!(matches!(block_size(&BigUint::from(3233u32)), Err(CipherError::ModulusTooSmall(12))));
        Ok(())
    }

    #[test]
    fn function_test() -> Result<(), Box<dyn Error>> {
        let mut state = RandState::new(31337);
        for (nbits, seed) in [(16u64, 1u64), (64, 2), (256, 3)] {
            let keys = keys(nbits, seed);
            let k = block_size(&keys.public.n)?;
            for len in [0, 1, k - 1, k, k + 1, 2 * k, 3 * (k - 1), 5 * k + 3, 7 * k] {
                let mut data = vec![0u8; len];
                state.fill(&mut data);
                let (cipher, plain) = round_trip(&keys, &data)?;
                assert_eq!(plain, data, "nbits {} len {}", nbits, len);
                let blocks = (len + k - 2) / (k - 1);
                assert_eq!(cipher.lines().count(), blocks);
            }
        }
        Ok(())
    }

    #[test]
    fn zero_bytes_and_sentinel_values_survive() -> Result<(), Box<dyn Error>> {
        let keys = keys(64, 8);
        let k = block_size(&keys.public.n)?;
        for data in [vec![0u8; 3 * k], vec![0xFF; 2 * k + 1], vec![0, 0xFF, 0, 0xFF]] {
            assert_eq!(round_trip(&keys, &data)?.1, data);
        }
        Ok(())
    }

    #[test]
    fn empty_input_emits_nothing() -> Result<(), Box<dyn Error>> {
        let keys = keys(64, 9);
        let (cipher, plain) = round_trip(&keys, b"")?;
        assert!(cipher.is_empty());
        assert!(plain.is_empty());
        Ok(())
    }

    #[test]
    fn ciphertext_is_one_hex_line_per_block() -> Result<(), Box<dyn Error>> {
        let keys = keys(64, 10);
        let (cipher, _) = round_trip(&keys, b"hello, block world")?;
        for line in cipher.lines() {
            let c = BigUint::parse_bytes(line.as_bytes(), 16).ok_or("bad hex")?;
            assert!(c < keys.public.n);
            assert_eq!(line, line.to_lowercase());
        }
        Ok(())
    }

    #[test]
    fn decrypt_skips_blank_lines() -> Result<(), Box<dyn Error>> {
        let keys = keys(64, 11);
        let (cipher, _) = round_trip(&keys, b"blank lines")?;
        let spaced = format!("\n{}\n\n", cipher.replace('\n', "\n\r\n"));
        let mut plain = Vec::new();
        decrypt_stream(&mut Cursor::new(spaced), &mut plain, &keys.private)?;
        assert_eq!(plain, b"blank lines");
        Ok(())
    }

    #[test]
    fn malformed_ciphertext() {
        let keys = keys(64, 12);
        let (cipher, _) = round_trip(&keys, b"hi").unwrap();
        for bad in ["not-hex", "c_a1", "+ca1", "-1"] {
            let mut out = Vec::new();
            let err = decrypt_stream(&mut Cursor::new(format!("{}{}\n", cipher, bad)), &mut out, &keys.private).unwrap_err();
            match err {
                CipherError::BadBlock { line, text } => {
                    assert_eq!(line, 2);
                    assert_eq!(text, bad);
                }
                other => panic!("{} gave {:?}", bad, other),
            }
            assert_eq!(out, b"hi");
        }
    }

    #[test]
    fn wrong_key_is_detected() -> Result<(), Box<dyn Error>> {
        let (ours, theirs) = (keys(128, 13), keys(128, 14));
        let mut cipher = Vec::new();
        encrypt_stream(&mut Cursor::new(vec![7u8; 100]), &mut cipher, &ours.public)?;
        let stranger = PrivateKey { n: ours.private.n.clone(), d: theirs.private.d.clone() };
        let mut out = Vec::new();
        match decrypt_stream(&mut Cursor::new(&cipher), &mut out, &stranger) {
            Err(CipherError::MissingSentinel { .. }) | Err(CipherError::BlockTooLong { .. }) => {}
            Ok(_) => assert_ne!(out, vec![7u8; 100]),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    #[test]
    fn tiny_modulus_is_rejected() {
        let key = PublicKey {
            n: BigUint::from(3233u32),
            e: BigUint::from(17u32),
            signature: BigUint::from(43u32),
            owner: "bo".to_string(),
        };
        let mut out = Vec::new();
        let err = encrypt_stream(&mut Cursor::new(b"x"), &mut out, &key).unwrap_err();
        assert!(matches!(err, CipherError::ModulusTooSmall(12)));
        assert!(out.is_empty());
    }
}
