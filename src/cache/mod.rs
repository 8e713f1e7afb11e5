//! Persistent digest cache.
//!
//! This module stores MD5 and SHA-256 digests so that unchanged files are
//! not re-hashed on later runs.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence and the `get_or_compute` operation.
//! * [`entry`]: File identity, stored records and lookup classification.
//! * [`schema`]: Table creation and versioning.
//!
//! # Cache Invalidation
//!
//! Records are keyed by `(device, inode)`, so hard links share one record
//! and renames keep it. A record is reused only while the file's size and
//! modification time (in nanoseconds) still equal the stored values; any
//! difference rehashes the file and overwrites the record in place.
//!
//! A rewrite that keeps both size and mtime unchanged is not detected.
//! Records for deleted files are never purged.

pub mod database;
pub mod entry;
pub mod schema;

pub use database::{CacheError, CacheResult, CacheStats, HashCache};
pub use entry::{DigestRecord, FileIdentity, Lookup};
