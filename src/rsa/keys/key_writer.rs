use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use num_bigint::BigUint;
use crate::rsa::keys::{KeyError, PrivateKey, PublicKey};
#[cfg(unix)]
use std::fs::Permissions;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Writes key fields as one lowercase hex number per line.
pub struct KeyWriter<W: Write> {
    writer: W,
}

impl<W: Write> KeyWriter<W> {
    pub fn new(writer: W) -> Self {
        KeyWriter { writer }
    }

    pub fn write_hex(&mut self, value: &BigUint) -> Result<(), KeyError> {
        writeln!(self.writer, "{:x}", value)?;
        Ok(())
    }

    /// Writes `text` as the last line of the file, no terminator after it.
    pub fn write_last(&mut self, text: &str) -> Result<(), KeyError> {
        write!(self.writer, "{}", text)?;
        Ok(())
    }

    pub fn write_public(&mut self, key: &PublicKey) -> Result<(), KeyError> {
        self.write_hex(&key.n)?;
        self.write_hex(&key.e)?;
        self.write_hex(&key.signature)?;
        self.write_last(&key.owner)?;
        self.flush()
    }

    pub fn write_private(&mut self, key: &PrivateKey) -> Result<(), KeyError> {
        self.write_hex(&key.n)?;
        self.write_hex(&key.d)?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), KeyError> {
        self.writer.flush()?;
        Ok(())
    }
}

fn file_error(path: &Path) -> impl FnOnce(std::io::Error) -> KeyError + '_ {
    move |source| KeyError::File { path: path.to_path_buf(), source }
}

/// Private key files are readable and writable by the owner only.
fn create_private(path: &Path) -> Result<File, KeyError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let file = options.open(path).map_err(file_error(path))?;
    // mode() only applies when the file is newly created
    #[cfg(unix)]
    file.set_permissions(Permissions::from_mode(0o600)).map_err(file_error(path))?;
    Ok(file)
}

impl PublicKey {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), KeyError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(file_error(path))?;
        KeyWriter::new(BufWriter::new(file)).write_public(self)
    }
}

impl PrivateKey {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), KeyError> {
        let path = path.as_ref();
        let file = create_private(path)?;
        KeyWriter::new(BufWriter::new(file)).write_private(self)
    }
}
