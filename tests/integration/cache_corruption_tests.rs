use hashcache::cache::{CacheError, HashCache};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_open_corrupted_database() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    {
        let mut f = fs::File::create(path).unwrap();
        f.write_all(b"not a sqlite database, just some bytes that are long enough")
            .unwrap();
    }

    let err = HashCache::open(path).unwrap_err();
    assert!(matches!(err, CacheError::Store(_)));
    assert!(!err.is_per_file());
}

#[test]
fn test_recovery_after_deleting_corrupted_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    fs::write(
        &path,
        b"corrupted garbage corrupted garbage corrupted garbage",
    )
    .unwrap();
    assert!(HashCache::open(&path).is_err());

    fs::remove_file(&path).unwrap();
    let cache = HashCache::open(&path).expect("Should succeed after deleting corrupted file");
    assert!(cache.is_empty().unwrap());
    assert_eq!(cache.schema_version().unwrap(), 1);
}

#[test]
fn test_empty_file_is_a_fresh_store() {
    // SQLite treats a zero-length file as an empty database.
    let temp_file = NamedTempFile::new().unwrap();
    let cache = HashCache::open(temp_file.path()).unwrap();
    assert_eq!(cache.schema_version().unwrap(), 1);
}
