//! Command-line interface definitions for hashcache.
//!
//! # Example
//!
//! ```bash
//! # Warm the cache for a tree without printing anything
//! hashcache ~/Pictures
//!
//! # Print SHA-256 digests in sha256sum format
//! hashcache --print-sha256 ~/Pictures > pictures.sha256
//!
//! # Use a project-local cache and JSON output
//! hashcache --database ./.hashcache --print md5 --output json src/
//! ```

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::output::{DigestKind, OutputFormat};

/// Print file digests, reusing cached results for unchanged files.
///
/// Digests are cached by device and inode, and reused while the file's size
/// and modification time are unchanged.
#[derive(Debug, Parser)]
#[command(name = "hashcache")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("digest").args(["print", "print_md5", "print_sha256"])))]
pub struct Cli {
    /// Files or directories to hash (directories are walked recursively)
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Digest to print; nothing is printed if omitted
    #[arg(long, value_enum, value_name = "KIND")]
    pub print: Option<DigestKind>,

    /// Print MD5 digests (same as --print md5)
    #[arg(long)]
    pub print_md5: bool,

    /// Print SHA-256 digests (same as --print sha256)
    #[arg(long)]
    pub print_sha256: bool,

    /// Output format for printed digests
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Path to the cache database
    ///
    /// If not specified, the config file or `~/.hashcache` is used.
    #[arg(long, value_name = "PATH", env = "HASHCACHE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// The digest kind selected by `--print`, `--print-md5` or `--print-sha256`.
    #[must_use]
    pub fn digest_kind(&self) -> Option<DigestKind> {
        if self.print_md5 {
            Some(DigestKind::Md5)
        } else if self.print_sha256 {
            Some(DigestKind::Sha256)
        } else {
            self.print
        }
    }
}
