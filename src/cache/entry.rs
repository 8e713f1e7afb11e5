//! Cache key and record definitions.

use std::fs::Metadata;

use crate::scanner::Digests;

/// Identity of a file as reported by the filesystem.
///
/// `(dev, ino)` is the true identity and the store's primary key. `size` and
/// `mtime_ns` only fingerprint the content: if either differs from the stored
/// record, the record is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Device ID of the filesystem holding the file
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// File size in bytes
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: i64,
}

impl FileIdentity {
    /// Build an identity from file metadata.
    ///
    /// Returns `None` on platforms whose stable std API does not expose
    /// device and inode numbers.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        let mtime_ns = metadata
            .mtime()
            .saturating_mul(1_000_000_000)
            .saturating_add(metadata.mtime_nsec());
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
            size: metadata.size(),
            mtime_ns,
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Whether `record` was computed for this exact size and mtime.
    #[must_use]
    pub fn matches(&self, record: &DigestRecord) -> bool {
        record.size == self.size && record.mtime_ns == self.mtime_ns
    }
}

/// Digest pair stored for one `(dev, ino)` key, with the fingerprint it was
/// computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestRecord {
    /// Size at the time of hashing
    pub size: u64,
    /// Modification time at the time of hashing
    pub mtime_ns: i64,
    /// The computed digests
    pub digests: Digests,
}

impl DigestRecord {
    /// Create a record for `identity` holding `digests`.
    #[must_use]
    pub fn new(identity: &FileIdentity, digests: Digests) -> Self {
        Self {
            size: identity.size,
            mtime_ns: identity.mtime_ns,
            digests,
        }
    }
}

/// Result of checking the store for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Stored digests are valid for the current fingerprint.
    Hit(Digests),
    /// No record for this `(dev, ino)`.
    Missing,
    /// A record exists but size or mtime changed since it was written.
    Stale(DigestRecord),
}

impl Lookup {
    /// Classify an optional stored record against the current identity.
    #[must_use]
    pub fn classify(identity: &FileIdentity, stored: Option<DigestRecord>) -> Self {
        match stored {
            None => Self::Missing,
            Some(record) if identity.matches(&record) => Self::Hit(record.digests),
            Some(record) => Self::Stale(record),
        }
    }
}
