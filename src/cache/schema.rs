//! Store schema creation and versioning.
//!
//! The schema version lives in SQLite's `PRAGMA user_version`, which is 0 for
//! a fresh file. Each migration moves the store forward by one version inside
//! the same transaction as its DDL, so a crash leaves either the old or the
//! new version, never a half-applied one.
//!
//! - Version 1: the `digest` table keyed by `(dev, ino)`.
//!
//! Later versions must be additive; version 1's table is never rewritten
//! without carrying its rows across.

use rusqlite::{Connection, Transaction};

/// Schema version this build writes.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const V1_DIGEST_TABLE: &str = "CREATE TABLE digest (
    dev INTEGER,
    ino INTEGER,
    size INTEGER,
    time INTEGER,
    md5 BLOB,
    sha256 BLOB,
    PRIMARY KEY (dev, ino)
)";

/// Read the stored schema version.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Bring the store up to [`CURRENT_SCHEMA_VERSION`].
///
/// Returns the version found before migrating.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;
    let found = schema_version(&tx)?;

    if found < 1 {
        migrate_to_v1(&tx)?;
    }
    if found > CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Cache schema version {} is newer than supported version {}",
            found,
            CURRENT_SCHEMA_VERSION
        );
    }

    tx.commit()?;
    Ok(found)
}

fn migrate_to_v1(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    log::debug!("Creating cache schema version 1");
    tx.execute_batch(V1_DIGEST_TABLE)?;
    tx.pragma_update(None, "user_version", 1)
}
