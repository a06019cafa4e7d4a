//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, the file universe behind every
//! cache query. Each call reads the filesystem fresh; nothing is memoized
//! between scans, so a file written by the retrieval tool shows up on the
//! very next scan.
//!
//! # Features
//!
//! - Parallel directory traversal using rayon thread pool
//! - Deterministic (name-sorted) traversal order
//! - Audio extension filtering
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering and optional symlink following
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use trackcache::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/srv/music"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{ScanError, ScanOutcome, ScanSummary, WalkerConfig};

/// Directory walker for audio file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root directory.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries
    /// as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory this walker scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check whether the root can be scanned at all.
    ///
    /// Returns the reason the cache is unavailable, or `None` if the walk
    /// should proceed.
    fn check_root(&self) -> Option<ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => match std::fs::read_dir(&self.root) {
                Ok(_) => None,
                Err(e) => Some(io_error_to_scan_error(&self.root, e)),
            },
            Ok(_) => Some(ScanError::NotADirectory(self.root.clone())),
            Err(e) => Some(io_error_to_scan_error(&self.root, e)),
        }
    }

    /// Walk the directory tree, yielding audio file paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration; [`Walker::scan`] applies the skip/strict policy on top.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let ignore_root = self.root.clone();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });

                // Prune ignored entries here so ignored directories are never read
                if let Some(gi) = &gitignore {
                    children.retain(|child| match child {
                        Ok(entry) => {
                            let ignored = is_ignored(
                                gi,
                                &ignore_root,
                                &entry.path(),
                                entry.file_type().is_dir(),
                            );
                            if ignored {
                                log::trace!("Ignoring: {}", entry.path().display());
                            }
                            !ignored
                        }
                        Err(_) => true,
                    });
                }
            });

        // Ending the iterator drops jwalk's queue, so no further directories are read
        let stop = walk_dir.into_iter().take_while(move |_| {
            let requested = self.is_shutdown_requested();
            if requested {
                log::debug!("Walker: Shutdown requested, stopping iteration");
            }
            !requested
        });

        stop.filter_map(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path == self.root {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    if file_type.is_symlink() {
                        if !self.config.follow_symlinks {
                            log::trace!("Skipping symlink: {}", path.display());
                            return None;
                        }
                        // A followed link that still reports as a link is dangling
                        // or unresolvable; stat it to surface the real error.
                        match std::fs::metadata(&path) {
                            Ok(meta) if meta.is_file() => {}
                            Ok(_) => return None,
                            Err(e) => return Some(Err(self.handle_io_error(&path, e))),
                        }
                    } else if !file_type.is_file() {
                        return None;
                    }

                    if !self.config.is_supported(&path) {
                        log::trace!("Skipping non-audio file: {}", path.display());
                        return None;
                    }

                    Some(Ok(path))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_jwalk_error(path, e)))
                }
            }
        })
    }

    /// Scan the root and collect every audio file.
    ///
    /// A missing, non-directory, or unreadable root yields an empty outcome
    /// with [`ScanSummary::unavailable`] set. Entry errors are skipped and
    /// recorded, unless strict mode is on.
    ///
    /// # Errors
    ///
    /// In strict mode, returns the first entry error encountered.
    pub fn scan(&self) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let mut outcome = ScanOutcome::default();

        if let Some(reason) = self.check_root() {
            log::warn!("Music directory unavailable, treating as empty: {}", reason);
            outcome.summary.unavailable = Some(reason);
            outcome.summary.duration = start.elapsed();
            return Ok(outcome);
        }

        for entry in self.walk() {
            match entry {
                Ok(path) => outcome.files.push(path),
                Err(e) if self.config.strict => {
                    log::error!("Aborting scan of {}: {}", self.root.display(), e);
                    return Err(e);
                }
                Err(e) => outcome.summary.errors.push(e),
            }
        }

        let summary: &mut ScanSummary = &mut outcome.summary;
        summary.interrupted = self.is_shutdown_requested();
        summary.total_files = outcome.files.len();
        summary.duration = start.elapsed();

        log::debug!(
            "Scanned {}: {} audio files, {} skipped entries in {:?}",
            self.root.display(),
            summary.total_files,
            summary.errors.len(),
            summary.duration
        );

        Ok(outcome)
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        let err = io_error_to_scan_error(path, error);
        match &err {
            ScanError::NotFound(_) => {
                log::debug!("Entry vanished or dangling link: {}", path.display());
            }
            _ => log::warn!("{}", err),
        }
        err
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            },
        }
    }
}

fn io_error_to_scan_error(path: &Path, error: std::io::Error) -> ScanError {
    match error.kind() {
        ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
        ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
        _ => ScanError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Check if a path is ignored, relative to the scan root.
fn is_ignored(gitignore: &Gitignore, root: &Path, path: &Path, is_dir: bool) -> bool {
    let relative_path = path.strip_prefix(root).unwrap_or(path);

    // Gitignore matching uses forward slashes even on Windows.
    let path_str = relative_path.to_string_lossy();
    let normalized_path = if cfg!(windows) {
        path_str.replace('\\', "/")
    } else {
        path_str.into_owned()
    };

    gitignore.matched(normalized_path, is_dir).is_ignore()
}
