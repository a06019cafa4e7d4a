//! Cache entries and the path-to-title codec.
//!
//! A [`CacheEntry`] is nothing but a path. Its title and extension are
//! recomputed from the path on every access so they can never drift from
//! the file on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::scanner::path_utils::normalize_path_str;

/// Derive the canonical track title from a path.
///
/// Strips directory components and the final extension segment, then
/// normalizes to NFC. `"Albums/Song.live.mp3"` becomes `"Song.live"`.
/// A leading dot never starts an extension, so `".mp3"` is its own title.
///
/// Two files with the same name in different directories share a title.
#[must_use]
pub fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| normalize_path_str(&stem.to_string_lossy()))
        .unwrap_or_default()
}

/// The trailing dotted suffix of the file name, including the dot.
///
/// Returns an empty string when the name has no extension.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// One playable audio file, materialized for the duration of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheEntry {
    path: PathBuf,
}

impl CacheEntry {
    /// Wrap a scanned or freshly fetched path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the audio file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Track title derived from the path.
    #[must_use]
    pub fn title(&self) -> String {
        title_of(&self.path)
    }

    /// File extension derived from the path, e.g. `".mp3"`.
    #[must_use]
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }

    /// Content-type hint for playback, based on the extension.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.extension().to_ascii_lowercase().as_str() {
            ".mp3" => "audio/mpeg",
            ".flac" => "audio/flac",
            ".ogg" | ".oga" | ".opus" => "audio/ogg",
            ".m4a" | ".aac" => "audio/mp4",
            ".wav" => "audio/wav",
            ".webm" => "audio/webm",
            _ => "application/octet-stream",
        }
    }

    /// Consume the entry, returning its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A cache entry with its fuzzy-match score (higher is better).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMatch {
    /// The matched file.
    pub entry: CacheEntry,
    /// Relative match quality; only meaningful for ordering.
    pub score: u32,
}
