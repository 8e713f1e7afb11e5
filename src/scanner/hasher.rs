//! Streaming MD5 + SHA-256 file hasher.
//!
//! # Overview
//!
//! The [`Hasher`] reads a byte source once, in fixed-size chunks, and feeds
//! every chunk to both an MD5 and a SHA-256 accumulator. Memory use is bounded
//! by the chunk size no matter how large the input is.
//!
//! # Example
//!
//! ```
//! use hashcache::scanner::Hasher;
//!
//! let hasher = Hasher::new();
//! let digests = hasher.digest_reader(&b"abc"[..]).unwrap();
//! assert_eq!(digests.md5_hex(), "900150983cd24fb0d6963f7d28e17f72");
//! ```

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use super::HashError;

/// Read chunk size used for hashing (256 KiB).
pub const CHUNK_SIZE: usize = 262_144;

/// Length of an MD5 digest in bytes.
pub const MD5_LEN: usize = 16;

/// Length of a SHA-256 digest in bytes.
pub const SHA256_LEN: usize = 32;

/// The pair of digests computed over one byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digests {
    /// 128-bit MD5 digest
    pub md5: [u8; MD5_LEN],
    /// 256-bit SHA-256 digest
    pub sha256: [u8; SHA256_LEN],
}

impl Digests {
    /// MD5 digest as a lowercase hex string.
    #[must_use]
    pub fn md5_hex(&self) -> String {
        hash_to_hex(&self.md5)
    }

    /// SHA-256 digest as a lowercase hex string.
    #[must_use]
    pub fn sha256_hex(&self) -> String {
        hash_to_hex(&self.sha256)
    }
}

/// Streaming dual-digest hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher using the default [`CHUNK_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: CHUNK_SIZE,
        }
    }

    /// Create a hasher with a custom read buffer size.
    ///
    /// A size of zero is clamped to one byte.
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Hash everything readable from `reader`.
    ///
    /// Returns the digests together with the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns the first read error other than [`ErrorKind::Interrupted`].
    pub fn digest_reader_counted<R: Read>(&self, mut reader: R) -> io::Result<(Digests, u64)> {
        let mut md5 = Md5::new();
        let mut sha256 = Sha256::new();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            md5.update(&buffer[..n]);
            sha256.update(&buffer[..n]);
            total += n as u64;
        }

        let digests = Digests {
            md5: md5.finalize().into(),
            sha256: sha256.finalize().into(),
        };
        Ok((digests, total))
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns the first read error other than [`ErrorKind::Interrupted`].
    pub fn digest_reader<R: Read>(&self, reader: R) -> io::Result<Digests> {
        self.digest_reader_counted(reader)
            .map(|(digests, _)| digests)
    }

    /// Open and hash the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn digest_file(&self, path: &Path) -> Result<Digests, HashError> {
        self.digest_file_counted(path).map(|(digests, _)| digests)
    }

    /// Open and hash the file at `path`, also returning the bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn digest_file_counted(&self, path: &Path) -> Result<(Digests, u64), HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let result = self
            .digest_reader_counted(file)
            .map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Hashed {} bytes from {}", result.1, path.display());
        Ok(result)
    }
}

/// Convert a digest to a lowercase hex string.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Parse a hex string back into a fixed-size digest.
///
/// Returns `None` if the string has the wrong length or is not valid hex.
#[must_use]
pub fn hex_to_hash<const N: usize>(hex: &str) -> Option<[u8; N]> {
    if hex.len() != N * 2 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}
