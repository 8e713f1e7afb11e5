//! Output sinks for resolved digests.
//!
//! The cache always computes both digests; the sink decides which one the
//! user sees and how it is written:
//! - [`TextSink`]: one `<hex>  <path>` line per file (coreutils style)
//! - [`JsonSink`]: one JSON object per line for scripting
//!
//! # Example
//!
//! ```
//! use hashcache::output::{DigestKind, DigestSink, TextSink};
//! use hashcache::scanner::Hasher;
//! use std::path::Path;
//!
//! let digests = Hasher::new().digest_reader(&b"abc"[..]).unwrap();
//! let mut sink = TextSink::new(Vec::new(), DigestKind::Md5);
//! sink.emit(&digests, Path::new("abc.txt")).unwrap();
//! assert_eq!(
//!     String::from_utf8(sink.into_inner()).unwrap(),
//!     "900150983cd24fb0d6963f7d28e17f72  abc.txt\n"
//! );
//! ```

pub mod json;
pub mod text;

use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::scanner::Digests;

// Re-export main types
pub use json::JsonSink;
pub use text::TextSink;

/// Which digest a run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    /// 128-bit MD5
    Md5,
    /// 256-bit SHA-256
    Sha256,
}

impl DigestKind {
    /// Hex encoding of the selected digest.
    #[must_use]
    pub fn hex(self, digests: &Digests) -> String {
        match self {
            Self::Md5 => digests.md5_hex(),
            Self::Sha256 => digests.sha256_hex(),
        }
    }
}

impl std::fmt::Display for DigestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestKind::Md5 => write!(f, "md5"),
            DigestKind::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Output format for resolved digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `<hex>  <path>` lines
    #[default]
    Text,
    /// JSON Lines
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Receives one resolved file at a time.
pub trait DigestSink {
    /// Write the digest for `path`.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    fn emit(&mut self, digests: &Digests, path: &Path) -> io::Result<()>;

    /// Flush buffered output.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    fn flush(&mut self) -> io::Result<()>;
}

/// Sink that discards everything, used when no digest kind is selected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DigestSink for NullSink {
    fn emit(&mut self, _digests: &Digests, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Build the sink for a run.
///
/// With no digest kind selected nothing is printed.
#[must_use]
pub fn make_sink<'a, W: Write + 'a>(
    writer: W,
    kind: Option<DigestKind>,
    format: OutputFormat,
) -> Box<dyn DigestSink + 'a> {
    match (kind, format) {
        (None, _) => Box::new(NullSink),
        (Some(kind), OutputFormat::Text) => Box::new(TextSink::new(writer, kind)),
        (Some(kind), OutputFormat::Json) => Box::new(JsonSink::new(writer, kind)),
    }
}
