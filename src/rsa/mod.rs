use std::env;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use num_bigint::BigUint;
use thiserror::Error;

pub mod block;
pub mod config;
pub mod euclid;
pub mod key_gen;
pub mod keys;
pub mod prime_gen;
pub mod rand_state;

use block::*;
use config::*;
use keys::*;
use rand_state::RandState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Generate,
    Encrypt,
    Decrypt,
    Test,
}

#[macro_export]
macro_rules! rsa_t {
    ($CONFIG: expr, $NAME: ident) => {
#[derive(Debug, Parser)]
#[clap(version, about = "Textbook RSA: key generation, signed identities, block encryption")]
pub struct $NAME {
    #[clap(short, long, value_enum, default_value_t = $CONFIG.mode.clone(), help = "Run mode")]
    pub mode: RunMode,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.bits, help = "Bits budget for the public modulus n")]
    pub bits: u64,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.rounds, help = "Miller Rabin rounds for testing primes")]
    pub rounds: u32,
    #[clap(short, long, value_parser, default_value = $CONFIG.public.as_str(), help = "Public key file")]
    pub public: String,
    #[clap(short = 'd', long, value_parser, default_value = $CONFIG.private.as_str(), help = "Private key file")]
    pub private: String,
    #[clap(short, long, value_parser, default_value = $CONFIG.input.as_str(), help = "Input filename")]
    pub input: String,
    #[clap(short, long, value_parser, default_value = $CONFIG.output.as_str(), help = "Output filename")]
    pub output: String,
    #[clap(short, long, value_parser, help = "Random seed, defaults to the current time")]
    pub seed: Option<u64>,
    #[clap(short, long, value_parser, help = "Key owner, defaults to $USER")]
    pub user: Option<String>,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.verbose, help = "Print bit lengths and values of the key parts")]
    pub verbose: bool,
}
    };
}

rsa_t!(CONFIG_DEF, RSA);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot open `{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error(transparent)]
    Stream(#[from] io::Error),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("Signature is not verified for user `{0}'")]
    Unverified(String),

    #[error("no user name found, set $USER or pass --user")]
    NoIdentity,

    #[error("public and private key do not share a modulus")]
    Mismatch,

    #[error("decrypted data differs from the original")]
    RoundTrip,
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Unverified(_) => 2,
            _ => 1,
        }
    }
}

/// One `name (N bits) = value` line of the verbose report.
pub fn report(out: &mut dyn Write, name: &str, value: &BigUint) -> io::Result<()> {
    writeln!(out, "{} ({} bits) = {}", name, value.bits(), value)
}

impl RSA {
    fn reader(&self) -> Result<(Box<dyn Read>, Option<ProgressBar>), RunError> {
        if self.input == "stdin" { return Ok((Box::new(io::stdin()), None)); }
        let file = File::open(&self.input).map_err(|source| RunError::Io { path: self.input.clone(), source })?;
        if !self.verbose { return Ok((Box::new(file), None)); }
        let pb = ProgressBar::new(file.metadata().map(|m| m.len()).unwrap_or(0));
        pb.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()));
        Ok((Box::new(pb.wrap_read(file)), Some(pb)))
    }

    fn writer(&self) -> Result<Box<dyn Write>, RunError> {
        match self.output.as_str() {
            "stdout" => Ok(Box::new(io::stdout())),
            f => {
                let file = File::create(f).map_err(|source| RunError::Io { path: f.to_string(), source })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }

    /// Verbose lines go to stdout unless the data stream already does.
    fn report_sink(&self) -> Box<dyn Write> {
        match (self.mode, self.output.as_str()) {
            (RunMode::Encrypt | RunMode::Decrypt, "stdout") => Box::new(io::stderr()),
            _ => Box::new(io::stdout()),
        }
    }

    fn owner(&self) -> Result<String, RunError> {
        self.user.clone()
            .or_else(|| env::var("USER").ok())
            .or_else(|| env::var("USERNAME").ok())
            .filter(|u| !u.is_empty())
            .ok_or(RunError::NoIdentity)
    }

    fn rand_state(&self) -> RandState {
        match self.seed {
            Some(seed) => RandState::new(seed),
            None => RandState::from_clock(),
        }
    }

    /// A failed stream must not leave a half-written output file behind.
    fn finish(&self, result: Result<BlockStats, CipherError>, pb: Option<ProgressBar>) -> Result<BlockStats, RunError> {
        match result {
            Ok(stats) => {
                if let Some(pb) = pb { pb.finish_with_message("Done"); }
                Ok(stats)
            }
            Err(e) => {
                if let Some(pb) = pb { pb.abandon(); }
                if self.output != "stdout" {
                    if let Err(rm) = fs::remove_file(&self.output) {
                        log::warn!("cannot remove partial output {}: {}", self.output, rm);
                    }
                }
                Err(e.into())
            }
        }
    }

    fn generate(&self) -> Result<(), RunError> {
        let owner = self.owner()?;
        let mut state = self.rand_state();
        log::info!("generating a {}-bit key for `{}' with {} rounds, seed {}", self.bits, owner, self.rounds, state.seed());
        let generated = key_gen::generate_key(self.bits, self.rounds, &owner, &mut state)?;
        generated.keys.save(&self.public, &self.private)?;
        if self.verbose {
            let (public, private) = (&generated.keys.public, &generated.keys.private);
            let mut out = self.report_sink();
            writeln!(out, "user = {}", owner)?;
            report(&mut out, "s", &public.signature)?;
            report(&mut out, "p", &generated.factors.p)?;
            report(&mut out, "q", &generated.factors.q)?;
            report(&mut out, "n", &public.n)?;
            report(&mut out, "e", &public.e)?;
            report(&mut out, "d", &private.d)?;
        }
        log::info!("Generated key files: {}, {}", self.public, self.private);
        Ok(())
    }

    fn encrypt(&self) -> Result<(), RunError> {
        let (mut reader, pb) = self.reader()?;
        let key = PublicKey::load(&self.public)?;
        if self.verbose {
            let mut out = self.report_sink();
            writeln!(out, "user = {}", key.owner)?;
            report(&mut out, "s", &key.signature)?;
            report(&mut out, "n", &key.n)?;
            report(&mut out, "e", &key.e)?;
        }
        if !key.verify_owner()? {
            log::warn!("signature in {} opens to `{}'", self.public, key.signed_identity());
            return Err(RunError::Unverified(key.owner));
        }
        let mut writer = self.writer()?;
        let result = encrypt_stream(&mut reader, &mut writer, &key);
        drop(writer);
        let stats = self.finish(result, pb)?;
        log::info!("encrypted {} bytes in {} blocks", stats.bytes, stats.blocks);
        Ok(())
    }

    fn decrypt(&self) -> Result<(), RunError> {
        let (reader, pb) = self.reader()?;
        let key = PrivateKey::load(&self.private)?;
        if self.verbose {
            let mut out = self.report_sink();
            report(&mut out, "n", &key.n)?;
            report(&mut out, "d", &key.d)?;
        }
        let mut reader = BufReader::new(reader);
        let mut writer = self.writer()?;
        let result = decrypt_stream(&mut reader, &mut writer, &key);
        drop(writer);
        let stats = self.finish(result, pb)?;
        log::info!("decrypted {} blocks into {} bytes", stats.blocks, stats.bytes);
        Ok(())
    }

    /// Checks that a key file pair belongs together and round-trips data.
    fn test(&self) -> Result<(), RunError> {
        let keys = KeySet::load(&self.public, &self.private)?;
        if !keys.is_matched() { return Err(RunError::Mismatch); }
        if !keys.public.verify_owner()? {
            log::warn!("signature in {} opens to `{}'", self.public, keys.public.signed_identity());
            return Err(RunError::Unverified(keys.public.owner));
        }
        let source = if self.input == "stdin" {
            let k = block_size(&keys.public.n)?;
            let mut data = vec![0u8; 16 * k + 3];
            self.rand_state().fill(&mut data);
            data
        } else {
            fs::read(&self.input).map_err(|source| RunError::Io { path: self.input.clone(), source })?
        };
        let mut cipher = Vec::new();
        let sealed = encrypt_stream(&mut source.as_slice(), &mut cipher, &keys.public)?;
        let mut plain = Vec::new();
        decrypt_stream(&mut cipher.as_slice(), &mut plain, &keys.private)?;
        if plain != source { return Err(RunError::RoundTrip); }
        println!("Test pass: {} bytes in {} blocks for `{}'", sealed.bytes, sealed.blocks, keys.public.owner);
        Ok(())
    }

    pub fn run(&self) -> Result<(), RunError> {
        match self.mode {
            RunMode::Generate => self.generate(),
            RunMode::Encrypt => self.encrypt(),
            RunMode::Decrypt => self.decrypt(),
            RunMode::Test => self.test(),
        }
    }
}
