use crate::common::{write_file, ABC_MD5, ABC_SHA256, EMPTY_MD5, EMPTY_SHA256};
use filetime::{set_file_mtime, FileTime};
use hashcache::cache::{HashCache, Lookup};
use hashcache::scanner::Hasher;
use std::fs;
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn test_known_vectors_through_cache() {
    let dir = tempdir().unwrap();
    let empty = write_file(dir.path(), "empty", b"");
    let abc = write_file(dir.path(), "abc", b"abc");

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();

    let digests = cache.get_or_compute(&empty).unwrap();
    assert_eq!(digests.md5_hex(), EMPTY_MD5);
    assert_eq!(digests.sha256_hex(), EMPTY_SHA256);

    let digests = cache.get_or_compute(&abc).unwrap();
    assert_eq!(digests.md5_hex(), ABC_MD5);
    assert_eq!(digests.sha256_hex(), ABC_SHA256);
}

#[cfg(unix)]
#[test]
fn test_initial_scan_and_rescan() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("cache.db");
    let file = write_file(dir.path(), "data.bin", &vec![7u8; 600_000]);

    let mut cache = HashCache::open(&cache_path).unwrap();
    let first = cache.get_or_compute(&file).unwrap();
    assert_eq!(cache.stats().misses, 1);
    assert_eq!(cache.stats().bytes_hashed, 600_000);

    let second = cache.get_or_compute(&file).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
    // The hit read no content.
    assert_eq!(cache.stats().bytes_hashed, 600_000);
    assert_eq!(cache.len().unwrap(), 1);
}

#[cfg(unix)]
#[test]
fn test_cache_survives_reopen() {
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("cache.db");
    let file = write_file(dir.path(), "a.txt", b"abc");

    let mut cache = HashCache::open(&cache_path).unwrap();
    let first = cache.get_or_compute(&file).unwrap();
    cache.close().unwrap();

    let mut cache = HashCache::open(&cache_path).unwrap();
    let second = cache.get_or_compute(&file).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 0);
    assert_eq!(cache.schema_version().unwrap(), 1);
}

#[cfg(unix)]
#[test]
fn test_invalidation_on_size_change() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.txt", b"abc");

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();
    cache.get_or_compute(&file).unwrap();

    fs::write(&file, b"abcd").unwrap();
    let digests = cache.get_or_compute(&file).unwrap();

    let expected = Hasher::new().digest_reader(&b"abcd"[..]).unwrap();
    assert_eq!(digests, expected);
    assert_eq!(cache.stats().misses, 2);
    // Overwritten, not duplicated.
    assert_eq!(cache.len().unwrap(), 1);
}

#[cfg(unix)]
#[test]
fn test_invalidation_on_mtime_change_same_size() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.txt", b"abc");
    set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();
    cache.get_or_compute(&file).unwrap();

    fs::write(&file, b"xyz").unwrap();
    set_file_mtime(&file, FileTime::from_unix_time(1_600_000_001, 0)).unwrap();

    let digests = cache.get_or_compute(&file).unwrap();
    let expected = Hasher::new().digest_reader(&b"xyz"[..]).unwrap();
    assert_eq!(digests, expected);
    assert_eq!(cache.len().unwrap(), 1);
}

#[cfg(unix)]
#[test]
fn test_invalidation_on_nanosecond_mtime_change() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.txt", b"abc");
    set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 100)).unwrap();

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();
    cache.get_or_compute(&file).unwrap();

    set_file_mtime(&file, FileTime::from_unix_time(1_600_000_000, 200)).unwrap();
    let metadata = fs::metadata(&file).unwrap();
    if FileTime::from_last_modification_time(&metadata).nanoseconds() != 200 {
        // Filesystem without nanosecond timestamps.
        return;
    }

    cache.get_or_compute(&file).unwrap();
    assert_eq!(cache.stats().misses, 2);
}

/// Size and mtime are the only invalidation signal: a rewrite that keeps
/// both returns the old digests.
#[cfg(unix)]
#[test]
fn test_same_size_same_mtime_rewrite_is_not_detected() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.txt", b"abc");
    let mtime = FileTime::from_unix_time(1_600_000_000, 0);
    set_file_mtime(&file, mtime).unwrap();

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();
    let original = cache.get_or_compute(&file).unwrap();

    fs::write(&file, b"xyz").unwrap();
    set_file_mtime(&file, mtime).unwrap();

    let stale = cache.get_or_compute(&file).unwrap();
    assert_eq!(stale, original);
    assert_eq!(stale.md5_hex(), ABC_MD5);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
#[cfg(unix)]
fn test_hit_served_from_store_without_reading() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("cache.db");
    let file = write_file(dir.path(), "a.txt", b"abc");
    let metadata = fs::metadata(&file).unwrap();

    // A store written by another tool with a digest no hash of "abc" gives.
    {
        let conn = rusqlite::Connection::open(&cache_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE digest (dev INTEGER, ino INTEGER, size INTEGER, time INTEGER, \
             md5 BLOB, sha256 BLOB, PRIMARY KEY (dev, ino)); PRAGMA user_version = 1;",
        )
        .unwrap();
        let mtime_ns = metadata.mtime() * 1_000_000_000 + metadata.mtime_nsec();
        conn.execute(
            "INSERT INTO digest VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                metadata.dev() as i64,
                metadata.ino() as i64,
                metadata.size() as i64,
                mtime_ns,
                vec![0xaau8; 16],
                vec![0xbbu8; 32],
            ],
        )
        .unwrap();
    }

    let mut cache = HashCache::open(&cache_path).unwrap();
    let digests = cache.get_or_compute(&file).unwrap();
    assert_eq!(digests.md5, [0xaa; 16]);
    assert_eq!(digests.sha256, [0xbb; 32]);
    assert_eq!(cache.stats().bytes_hashed, 0);
}

#[test]
#[cfg(unix)]
fn test_rename_keeps_record() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "before.txt", b"abc");

    let mut cache = HashCache::open(&dir.path().join("cache.db")).unwrap();
    cache.get_or_compute(&file).unwrap();

    let renamed = dir.path().join("after.txt");
    fs::rename(&file, &renamed).unwrap();

    cache.get_or_compute(&renamed).unwrap();
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
#[cfg(unix)]
fn test_lookup_classification() {
    use hashcache::cache::FileIdentity;

    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.txt", b"abc");
    let mut cache = HashCache::open_in_memory().unwrap();

    let identity = FileIdentity::from_metadata(&fs::metadata(&file).unwrap()).unwrap();
    assert_eq!(cache.lookup(&identity).unwrap(), Lookup::Missing);

    let digests = cache.get_or_compute(&file).unwrap();
    assert_eq!(cache.lookup(&identity).unwrap(), Lookup::Hit(digests));
}
