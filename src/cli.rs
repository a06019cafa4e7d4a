//! Command-line interface definitions for trackcache.
//!
//! Global options (verbosity, color, config location, music directory) come
//! first, then one subcommand per cache operation.
//!
//! # Example
//!
//! ```bash
//! # Fuzzy search the cache
//! trackcache --music-dir ~/Music search "daft punk"
//!
//! # Exact lookup by title, with suggestions when missing
//! trackcache resolve "Interstellar Theme" --suggest 3
//!
//! # Resolve, downloading on a miss
//! trackcache fetch "Daft Punk - One More Time" --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Local music cache: fuzzy search, exact lookup, fetch on miss.
///
/// trackcache keeps audio files in a plain directory tree and finds them by
/// title. Tracks that are not cached yet can be downloaded with yt-dlp.
#[derive(Debug, Parser)]
#[command(name = "trackcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Emit errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to a TOML config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Cache root; overrides the config file and environment
    #[arg(long, value_name = "DIR", global = true)]
    pub music_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fuzzy search cached tracks by path and name
    Search(SearchArgs),
    /// Find a cached track whose title matches exactly
    Resolve(ResolveArgs),
    /// Resolve a track, downloading it first if it is not cached
    Fetch(FetchArgs),
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search text; an empty query lists every track
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Show at most N results
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the resolve subcommand.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Track title (file name without extension)
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// On a miss, list up to N similar titles
    #[arg(long, value_name = "N", default_value = "0")]
    pub suggest: usize,
}

/// Arguments for the fetch subcommand.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Track to resolve or download
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Give up on the download after SECS seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
