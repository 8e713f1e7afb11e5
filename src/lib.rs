//! hashcache - persistent digest cache for files
//!
//! Prints MD5 or SHA-256 digests for files and directory trees, keeping every
//! computed digest in a SQLite database keyed by device and inode. Files whose
//! size and modification time have not changed since the last run are not
//! read again.
//!
//! # Example
//!
//! ```no_run
//! use hashcache::cache::HashCache;
//! use std::path::Path;
//!
//! let mut cache = HashCache::open(Path::new("/tmp/hashcache.db")).unwrap();
//! let digests = cache.get_or_compute(Path::new("/etc/hostname")).unwrap();
//! println!("{}", digests.sha256_hex());
//! cache.close().unwrap();
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod signal;

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cache::{CacheStats, HashCache};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::DigestSink;
use crate::scanner::{Walker, WalkerConfig};
use crate::signal::ShutdownHandler;

/// Outcome of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files whose digests were resolved
    pub resolved: usize,
    /// Files skipped because they could not be stat'd or read
    pub skipped: usize,
    /// Errors reported by the directory walk
    pub walk_errors: usize,
    /// Whether the run stopped early on Ctrl+C
    pub interrupted: bool,
    /// Cache activity during the run
    pub cache: CacheStats,
}

impl RunSummary {
    /// Exit code describing this run.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.skipped > 0 || self.walk_errors > 0 {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        }
    }
}

/// Run the application with parsed CLI arguments.
///
/// # Errors
///
/// Returns an error if the cache database cannot be opened or written, or
/// if output cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let shutdown = signal::install_handler()?;
    let database = Config::load().resolve_database(cli.database.as_deref())?;
    log::debug!("Using cache database {}", database.display());

    let stdout = io::stdout().lock();
    let mut sink = output::make_sink(BufWriter::new(stdout), cli.digest_kind(), cli.output);

    let walker_config = WalkerConfig {
        skip_hidden: cli.skip_hidden,
    };
    let summary = run(
        &database,
        &cli.files,
        &walker_config,
        sink.as_mut(),
        &shutdown,
    )?;
    Ok(summary.exit_code())
}

/// Open the cache at `database`, resolve every path under `roots`, and
/// close the cache.
///
/// The cache is released on every return path; on error it is dropped
/// without the explicit close.
///
/// # Errors
///
/// Returns an error if the cache cannot be opened, queried, written or
/// closed, or if the sink fails.
pub fn run(
    database: &Path,
    roots: &[PathBuf],
    walker_config: &WalkerConfig,
    sink: &mut dyn DigestSink,
    shutdown: &ShutdownHandler,
) -> Result<RunSummary> {
    let mut cache = HashCache::open(database)
        .with_context(|| format!("Failed to open cache database {}", database.display()))?;

    let summary = process_paths(&mut cache, roots, walker_config, sink, shutdown)?;

    sink.flush().context("Failed to flush output")?;
    cache.close().context("Failed to close cache database")?;

    log::info!(
        "Processed {} files ({} cached, {} hashed, {} skipped)",
        summary.resolved,
        summary.cache.hits,
        summary.cache.misses,
        summary.skipped + summary.walk_errors
    );
    if summary.interrupted {
        log::warn!("Interrupted before all files were processed");
    }

    Ok(summary)
}

/// Resolve every candidate file under `roots` through `cache`.
///
/// Files are handled strictly one after another. Per-file failures are
/// logged and counted; a store failure aborts the batch.
///
/// # Errors
///
/// Returns an error on a store failure or when the sink cannot be written.
pub fn process_paths(
    cache: &mut HashCache,
    roots: &[PathBuf],
    walker_config: &WalkerConfig,
    sink: &mut dyn DigestSink,
    shutdown: &ShutdownHandler,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    'roots: for root in roots {
        let walker =
            Walker::new(root, walker_config.clone()).with_shutdown_flag(shutdown.get_flag());

        for entry in walker.walk() {
            if shutdown.is_shutdown_requested() {
                break 'roots;
            }

            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Skipping: {:#}", anyhow::Error::new(e));
                    summary.walk_errors += 1;
                    continue;
                }
            };

            match cache.get_or_compute(&path) {
                Ok(digests) => {
                    summary.resolved += 1;
                    sink.emit(&digests, &path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
                Err(e) if e.is_per_file() => {
                    log::warn!("Skipping: {:#}", anyhow::Error::new(e));
                    summary.skipped += 1;
                }
                Err(e) => {
                    let context = format!("Failed to resolve {}", path.display());
                    let err = anyhow::Error::new(e).context(context);
                    log::error!("{:#}", err);
                    return Err(err);
                }
            }
        }
    }

    summary.interrupted = shutdown.is_shutdown_requested();
    summary.cache = cache.stats();
    Ok(summary)
}
