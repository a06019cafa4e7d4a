//! Scanner module for discovering audio files under a music directory.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Filtering to the supported audio extensions
//! - Unicode normalization and folding of path text
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and audio file discovery
//! - [`path_utils`]: NFC normalization and case/diacritic folding
//!
//! # Error Policy
//!
//! An entry that fails mid-traversal (permission denied, broken symlink) is
//! skipped and recorded in [`ScanSummary::errors`]; siblings are still
//! visited. With [`WalkerConfig::strict`] the first such error aborts the
//! scan instead. A missing or unreadable root is never an error: the scan is
//! empty and the reason is kept in [`ScanSummary::unavailable`].
//!
//! # Example
//!
//! ```no_run
//! use trackcache::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/srv/music"), WalkerConfig::default());
//! let outcome = walker.scan().unwrap();
//! for path in &outcome.files {
//!     println!("{}", path.display());
//! }
//! if !outcome.summary.is_complete() {
//!     eprintln!("{} entries skipped", outcome.summary.errors.len());
//! }
//! ```

pub mod path_utils;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use walker::Walker;

/// Extensions recognized as audio when no configuration overrides them.
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3"];

/// Configuration for directory walking.
///
/// Controls which files count as audio, symlink handling, and the
/// per-entry error policy.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Supported extensions, lowercase and without the leading dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style), relative to the root.
    pub ignore_patterns: Vec<String>,

    /// Abort the scan on the first entry error instead of skipping it.
    pub strict: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            strict: false,
        }
    }
}

impl WalkerConfig {
    /// Replace the supported extension set.
    ///
    /// Entries are lowercased and stripped of a leading `.`, so `".MP3"`,
    /// `"mp3"` and `"Mp3"` all mean the same thing. Blank entries are dropped.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Set strict mode (abort on the first entry error).
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set gitignore-style ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Check whether a path carries one of the supported extensions.
    ///
    /// The comparison is case-insensitive: `Song.MP3` is audio.
    #[must_use]
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Everything a scan produced: the audio files plus how the scan went.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Audio file paths in traversal order.
    pub files: Vec<PathBuf>,
    /// Status of the scan.
    pub summary: ScanSummary,
}

/// Status information for a single scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of audio files found.
    pub total_files: usize,
    /// Entries skipped because they could not be read.
    pub errors: Vec<ScanError>,
    /// Why the root itself could not be scanned, if it could not.
    pub unavailable: Option<ScanError>,
    /// Whether the walk stopped early on a shutdown request.
    pub interrupted: bool,
    /// Wall-clock time spent walking.
    pub duration: Duration,
}

impl ScanSummary {
    /// True when every entry was visited and none had to be skipped.
    ///
    /// An unavailable root counts as complete: it is an empty cache, not a
    /// partial one.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && !self.interrupted
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
