use crate::common::{write_file, RecordingSink, ABC_MD5, EMPTY_SHA256};
use hashcache::error::ExitCode;
use hashcache::output::{DigestKind, TextSink};
use hashcache::scanner::WalkerConfig;
use hashcache::signal::ShutdownHandler;
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn test_run_resolves_tree_in_order() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    write_file(&tree, "b.txt", b"abc");
    write_file(&tree, "a.txt", b"");
    write_file(&tree, "sub/c.txt", b"abc");

    let mut sink = RecordingSink::default();
    let summary = hashcache::run(
        &dir.path().join("cache.db"),
        &[tree.clone()],
        &WalkerConfig::default(),
        &mut sink,
        &ShutdownHandler::new(),
    )
    .unwrap();

    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.exit_code(), ExitCode::Success);
    assert!(sink.flushed);

    let paths: Vec<_> = sink.entries.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(
        paths,
        vec![tree.join("a.txt"), tree.join("b.txt"), tree.join("sub").join("c.txt")]
    );
    assert_eq!(sink.entries[0].1.sha256_hex(), EMPTY_SHA256);
    assert_eq!(sink.entries[1].1, sink.entries[2].1);
}

#[test]
#[cfg(unix)]
fn test_second_run_is_all_hits() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    for i in 0..20 {
        write_file(
            &tree,
            &format!("file_{i}.txt"),
            format!("content {i:010}").as_bytes(),
        );
    }
    let cache_path = dir.path().join("cache.db");

    let first = hashcache::run(
        &cache_path,
        &[tree.clone()],
        &WalkerConfig::default(),
        &mut RecordingSink::default(),
        &ShutdownHandler::new(),
    )
    .unwrap();
    assert_eq!(first.cache.misses, 20);

    let second = hashcache::run(
        &cache_path,
        &[tree],
        &WalkerConfig::default(),
        &mut RecordingSink::default(),
        &ShutdownHandler::new(),
    )
    .unwrap();
    assert_eq!(second.cache.hits, 20);
    assert_eq!(second.cache.misses, 0);
    assert_eq!(second.cache.bytes_hashed, 0);
}

#[cfg(unix)]
#[test]
fn test_run_text_output() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "abc.txt", b"abc");

    let mut sink = TextSink::new(Vec::new(), DigestKind::Md5);
    hashcache::run(
        &dir.path().join("cache.db"),
        &[file.clone()],
        &WalkerConfig::default(),
        &mut sink,
        &ShutdownHandler::new(),
    )
    .unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out, format!("{}  {}\n", ABC_MD5, file.display()));
}

#[cfg(unix)]
#[test]
fn test_interrupted_run_processes_nothing() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "abc.txt", b"abc");
    let cache_path = dir.path().join("cache.db");

    let shutdown = ShutdownHandler::new();
    shutdown.request_shutdown();

    let mut sink = RecordingSink::default();
    let summary = hashcache::run(
        &cache_path,
        &[file],
        &WalkerConfig::default(),
        &mut sink,
        &shutdown,
    )
    .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.exit_code(), ExitCode::Interrupted);
    assert!(sink.entries.is_empty());

    let cache = hashcache::cache::HashCache::open(&cache_path).unwrap();
    assert!(cache.is_empty().unwrap());
}

#[cfg(unix)]
#[test]
fn test_skip_hidden_option() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    write_file(&tree, ".hidden", b"h");
    write_file(&tree, "shown.txt", b"s");

    let mut sink = RecordingSink::default();
    let summary = hashcache::run(
        &dir.path().join("cache.db"),
        &[tree.clone()],
        &WalkerConfig { skip_hidden: true },
        &mut sink,
        &ShutdownHandler::new(),
    )
    .unwrap();

    assert_eq!(summary.resolved, 1);
    assert_eq!(sink.entries[0].0, tree.join("shown.txt"));
}
