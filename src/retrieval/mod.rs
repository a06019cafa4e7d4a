//! Retrieval of tracks that are not in the local cache.
//!
//! The resolver only needs one capability from the outside world: given a
//! query and a destination directory, produce an audio file and say where it
//! is. That capability is the [`Fetcher`] trait. [`YtDlpFetcher`] implements
//! it by running an external download tool; tests plug in their own.
//!
//! Fetching is synchronous and single-attempt. Failures are reported as a
//! [`RetrievalError`] whose [`diagnostic`](RetrievalError::diagnostic) text
//! is meant for the user; retrying is the caller's decision.

pub mod ytdlp;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

pub use ytdlp::{FetchConfig, YtDlpFetcher};

/// Something that can fetch a track into the music directory.
pub trait Fetcher: Send + Sync {
    /// Fetch the best match for `query` into `dest`.
    ///
    /// Blocks until the file is written or the attempt fails. Returns the
    /// path of the new file as reported by the fetch tool.
    ///
    /// # Errors
    ///
    /// Any failure to produce a file is a [`RetrievalError`].
    fn fetch(&self, query: &str, dest: &Path) -> Result<PathBuf, RetrievalError>;
}

/// A fetcher for setups without a retrieval tool; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFetcher;

impl Fetcher for DisabledFetcher {
    fn fetch(&self, _query: &str, _dest: &Path) -> Result<PathBuf, RetrievalError> {
        Err(RetrievalError::Disabled)
    }
}

/// Errors from a retrieval attempt.
#[derive(thiserror::Error, Debug)]
pub enum RetrievalError {
    /// The tool could not be started (missing binary, bad permissions).
    #[error("Failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        /// Program that failed
        program: String,
        /// Exit status of the process
        status: ExitStatus,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The tool did not finish in time and was killed.
    #[error("{program} timed out after {}s and was terminated", .timeout.as_secs_f64())]
    TimedOut {
        /// Program that timed out
        program: String,
        /// The limit that was exceeded
        timeout: Duration,
    },

    /// Shutdown was requested while the tool was running; it was killed.
    #[error("Retrieval cancelled; {program} was terminated")]
    Cancelled {
        /// Program that was terminated
        program: String,
    },

    /// The tool succeeded but did not print the path it wrote.
    #[error("{program} exited successfully but reported no output file")]
    NoOutput {
        /// Program that produced no path
        program: String,
    },

    /// The reported file is not present in the music directory.
    #[error("Fetched file is not in the cache: {0}")]
    MissingOutput(PathBuf),

    /// Waiting on the process failed.
    #[error("I/O error while running {program}: {source}")]
    Io {
        /// Program being waited on
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No retrieval tool is configured.
    #[error("Retrieval is disabled")]
    Disabled,
}

impl RetrievalError {
    /// Human-readable explanation of the failure. Never empty.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}
