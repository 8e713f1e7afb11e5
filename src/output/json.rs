//! JSON Lines output for scripting.
//!
//! # Output Schema
//!
//! One object per line:
//!
//! ```json
//! {"algorithm":"sha256","digest":"ba7816bf...","path":"/data/abc.txt"}
//! ```

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use super::{DigestKind, DigestSink};
use crate::scanner::Digests;

/// A single resolved file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRecord<'a> {
    /// Which digest `digest` holds
    pub algorithm: DigestKind,
    /// Lowercase hex digest
    pub digest: String,
    /// Path as given on the command line or found by the walk
    pub path: std::borrow::Cow<'a, str>,
}

/// Writes one [`JsonRecord`] per line.
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
    kind: DigestKind,
}

impl<W: Write> JsonSink<W> {
    /// Create a sink printing `kind` digests to `writer`.
    pub fn new(writer: W, kind: DigestKind) -> Self {
        Self { writer, kind }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DigestSink for JsonSink<W> {
    fn emit(&mut self, digests: &Digests, path: &Path) -> io::Result<()> {
        let record = JsonRecord {
            algorithm: self.kind,
            digest: self.kind.hex(digests),
            // Lossy: JSON strings must be valid Unicode.
            path: path.to_string_lossy(),
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
