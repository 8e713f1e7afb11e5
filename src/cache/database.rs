//! SQLite-backed digest cache.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::{DigestRecord, FileIdentity, Lookup};
use super::schema;
use crate::scanner::{Digests, HashError, Hasher};

/// Errors that can occur while resolving a file through the cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The file could not be stat'd.
    #[error("Cannot stat {path}")]
    Stat {
        /// Path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was stat'd but its content could not be read.
    #[error("Cannot read file content")]
    Read(#[from] HashError),

    /// The platform does not report a device/inode identity.
    #[error("File identity unavailable for {0}")]
    IdentityUnavailable(PathBuf),

    /// The directory meant to hold the store could not be created.
    #[error("Cannot create cache directory {path}")]
    StoreLocation {
        /// Directory that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The store could not be opened, migrated, queried or written.
    #[error("Cache database error")]
    Store(#[from] rusqlite::Error),
}

impl CacheError {
    /// Whether the error concerns a single file and the run can continue.
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::StoreLocation { .. })
    }
}

/// Convenient alias for cache results.
pub type CacheResult<T> = Result<T, CacheError>;

/// Per-run cache activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the store
    pub hits: usize,
    /// Lookups that required hashing (new or stale)
    pub misses: usize,
    /// Bytes of file content read for hashing
    pub bytes_hashed: u64,
}

/// Persistent digest cache keyed by `(dev, ino)`.
///
/// The handle owns the only connection for the run. Every miss is written
/// and committed on its own before `get_or_compute` returns. Dropping the
/// handle closes the connection; [`HashCache::close`] does the same but
/// reports errors.
pub struct HashCache {
    conn: Connection,
    hasher: Hasher,
    stats: CacheStats,
}

impl std::fmt::Debug for HashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashCache")
            .field("path", &self.conn.path())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// dev/ino are unsigned 64-bit; SQLite INTEGER is signed. Store the bit pattern.
fn to_sql_u64(v: u64) -> i64 {
    v as i64
}

fn from_sql_u64(v: i64) -> u64 {
    v as u64
}

impl HashCache {
    /// Open or create the cache at `path` and migrate it.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the file is not a usable SQLite
    /// database or the schema cannot be brought up to date.
    pub fn open(path: &Path) -> CacheResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                log::debug!("Creating cache directory {}", parent.display());
                std::fs::create_dir_all(parent).map_err(|source| CacheError::StoreLocation {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        log::debug!("Opened cache database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> CacheResult<Self> {
        // Losing the last commit on power failure only costs a rehash.
        conn.pragma_update(None, "synchronous", 0)?;
        let found = schema::migrate(&mut conn)?;
        if found < schema::CURRENT_SCHEMA_VERSION {
            log::debug!(
                "Migrated cache schema from version {} to {}",
                found,
                schema::CURRENT_SCHEMA_VERSION
            );
        }

        Ok(Self {
            conn,
            hasher: Hasher::new(),
            stats: CacheStats::default(),
        })
    }

    /// Replace the hasher used on cache misses.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Return the digests for the file at `path`, hashing it only if the
    /// stored record is missing or stale.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Stat`] if the file cannot be stat'd
    /// - [`CacheError::IdentityUnavailable`] on platforms without inode numbers
    /// - [`CacheError::Read`] if the content cannot be read; nothing is stored
    /// - [`CacheError::Store`] if the store cannot be queried or written
    pub fn get_or_compute(&mut self, path: &Path) -> CacheResult<Digests> {
        let metadata = std::fs::metadata(path).map_err(|source| CacheError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = FileIdentity::from_metadata(&metadata)
            .ok_or_else(|| CacheError::IdentityUnavailable(path.to_path_buf()))?;

        match self.lookup(&identity)? {
            Lookup::Hit(digests) => {
                log::debug!("Cache hit: {}", path.display());
                self.stats.hits += 1;
                return Ok(digests);
            }
            Lookup::Stale(record) => {
                log::debug!(
                    "Stale cache entry for {} (size {} -> {}, mtime {} -> {})",
                    path.display(),
                    record.size,
                    identity.size,
                    record.mtime_ns,
                    identity.mtime_ns
                );
            }
            Lookup::Missing => {}
        }

        log::info!("Hashing: {}", path.display());
        let (digests, bytes) = self.hasher.digest_file_counted(path)?;
        self.stats.misses += 1;
        self.stats.bytes_hashed += bytes;

        self.store(&identity, &digests)?;
        Ok(digests)
    }

    /// Check the store for `identity` without touching the file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the query fails.
    pub fn lookup(&self, identity: &FileIdentity) -> CacheResult<Lookup> {
        let stored = self.get_record(identity.dev, identity.ino)?;
        Ok(Lookup::classify(identity, stored))
    }

    /// Fetch the raw record for a `(dev, ino)` key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the query fails or a stored digest
    /// has the wrong length.
    pub fn get_record(&self, dev: u64, ino: u64) -> CacheResult<Option<DigestRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT size, time, md5, sha256 FROM digest WHERE dev = ?1 AND ino = ?2",
        )?;
        let record = stmt
            .query_row(params![to_sql_u64(dev), to_sql_u64(ino)], |row| {
                let md5: Vec<u8> = row.get(2)?;
                let sha256: Vec<u8> = row.get(3)?;
                let digests = Digests {
                    md5: blob_to_array(md5, 2)?,
                    sha256: blob_to_array(sha256, 3)?,
                };
                Ok(DigestRecord {
                    size: from_sql_u64(row.get(0)?),
                    mtime_ns: row.get(1)?,
                    digests,
                })
            })
            .optional()?;
        Ok(record)
    }

    /// Insert or replace the record for `identity` and commit it.
    ///
    /// Outside an explicit transaction each statement commits on its own.
    fn store(&self, identity: &FileIdentity, digests: &Digests) -> CacheResult<()> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR REPLACE INTO digest VALUES (?1, ?2, ?3, ?4, ?5, ?6)")?;
        stmt.execute(params![
            to_sql_u64(identity.dev),
            to_sql_u64(identity.ino),
            to_sql_u64(identity.size),
            identity.mtime_ns,
            &digests.md5[..],
            &digests.sha256[..],
        ])?;
        Ok(())
    }

    /// Number of records in the store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the query fails.
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM digest", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the store holds no records.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the query fails.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Persisted schema version.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the pragma cannot be read.
    pub fn schema_version(&self) -> CacheResult<i64> {
        Ok(schema::schema_version(&self.conn)?)
    }

    /// Activity counters since the cache was opened.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Close the connection, reporting any error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if SQLite refuses to close.
    pub fn close(self) -> CacheResult<()> {
        self.conn.close().map_err(|(_, e)| CacheError::Store(e))
    }
}

fn blob_to_array<const N: usize>(blob: Vec<u8>, column: usize) -> rusqlite::Result<[u8; N]> {
    let len = blob.len();
    <[u8; N]>::try_from(blob).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Blob,
            format!("expected {N}-byte digest, found {len} bytes").into(),
        )
    })
}
