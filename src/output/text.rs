//! Plain text output in the `md5sum` / `sha256sum` line format.

use std::io::{self, Write};
use std::path::Path;

use super::{DigestKind, DigestSink};
use crate::scanner::Digests;

/// Writes `<hex>  <path>\n` for each file.
///
/// On Unix the path bytes are written unchanged, so names that are not
/// valid UTF-8 survive a round trip through `sha256sum -c`.
#[derive(Debug)]
pub struct TextSink<W: Write> {
    writer: W,
    kind: DigestKind,
}

impl<W: Write> TextSink<W> {
    /// Create a sink printing `kind` digests to `writer`.
    pub fn new(writer: W, kind: DigestKind) -> Self {
        Self { writer, kind }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DigestSink for TextSink<W> {
    fn emit(&mut self, digests: &Digests, path: &Path) -> io::Result<()> {
        self.writer.write_all(self.kind.hex(digests).as_bytes())?;
        self.writer.write_all(b"  ")?;
        write_path(&mut self.writer, path)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(unix)]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    writer.write_all(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    write!(writer, "{}", path.display())
}
