//! JSON output for search, resolve and fetch results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "matches": [
//!     {
//!       "path": "/srv/music/Daft Punk - One More Time.mp3",
//!       "title": "Daft Punk - One More Time",
//!       "extension": ".mp3",
//!       "content_type": "audio/mpeg",
//!       "score": 1312
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 2,
//!     "skipped_entries": 0,
//!     "errors": [],
//!     "unavailable": null,
//!     "scan_duration_ms": 3,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "TC000"
//!   }
//! }
//! ```
//!
//! `resolve` and `fetch` print a single object with a `found` flag and an
//! optional `entry` instead of the `matches` array.

use std::io::Write;

use serde::Serialize;

use crate::cache::{CacheEntry, RankedMatch, SearchResults, Suggestion};
use crate::error::ExitCode;
use crate::scanner::ScanSummary;

/// A cache entry in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEntry {
    /// Path to the audio file
    pub path: String,
    /// Title derived from the file name
    pub title: String,
    /// Extension including the dot, or empty
    pub extension: String,
    /// Content-type hint for playback
    pub content_type: String,
    /// Fuzzy-match score, for search hits only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl JsonEntry {
    /// Create a JSON entry from a cache entry.
    #[must_use]
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            path: entry.path().to_string_lossy().into_owned(),
            title: entry.title(),
            extension: entry.extension(),
            content_type: entry.content_type().to_string(),
            score: None,
        }
    }

    /// Create a JSON entry from a ranked search hit.
    #[must_use]
    pub fn from_match(hit: &RankedMatch) -> Self {
        Self {
            score: Some(hit.score),
            ..Self::from_entry(&hit.entry)
        }
    }
}

/// A "did you mean" hint in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSuggestion {
    /// Path to the similar file
    pub path: String,
    /// Its title
    pub title: String,
    /// Similarity in `0.0..=1.0`
    pub similarity: f64,
}

impl JsonSuggestion {
    /// Create a JSON suggestion.
    #[must_use]
    pub fn from_suggestion(suggestion: &Suggestion) -> Self {
        Self {
            path: suggestion.entry.path().to_string_lossy().into_owned(),
            title: suggestion.entry.title(),
            similarity: suggestion.similarity,
        }
    }
}

/// Scan status in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of audio files found
    pub total_files: usize,
    /// Number of entries skipped because they could not be read
    pub skipped_entries: usize,
    /// Messages for the skipped entries
    pub errors: Vec<String>,
    /// Why the music directory could not be scanned at all, if it could not
    pub unavailable: Option<String>,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TC000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a scan summary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            skipped_entries: summary.errors.len(),
            errors: summary.errors.iter().map(ToString::to_string).collect(),
            unavailable: summary.unavailable.as_ref().map(ToString::to_string),
            scan_duration_ms: summary.duration.as_millis() as u64,
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// JSON output of `search`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSearchOutput {
    /// The query as given
    pub query: String,
    /// Hits, best first
    pub matches: Vec<JsonEntry>,
    /// Scan status
    pub summary: JsonSummary,
}

impl JsonSearchOutput {
    /// Build from search results, keeping at most `limit` hits.
    #[must_use]
    pub fn new(
        query: &str,
        results: &SearchResults,
        limit: Option<usize>,
        exit_code: ExitCode,
    ) -> Self {
        let limit = limit.unwrap_or(usize::MAX);
        Self {
            query: query.to_string(),
            matches: results
                .matches
                .iter()
                .take(limit)
                .map(JsonEntry::from_match)
                .collect(),
            summary: JsonSummary::from_scan_summary(&results.summary, exit_code),
        }
    }
}

/// JSON output of `resolve` and `fetch`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLookupOutput {
    /// The title or query as given
    pub query: String,
    /// Whether a track was found (or fetched)
    pub found: bool,
    /// The track, when found
    pub entry: Option<JsonEntry>,
    /// Similar titles, on a miss when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<JsonSuggestion>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl JsonLookupOutput {
    /// Build from an optional entry and any suggestions.
    #[must_use]
    pub fn new(
        query: &str,
        entry: Option<&CacheEntry>,
        suggestions: &[Suggestion],
        exit_code: ExitCode,
    ) -> Self {
        Self {
            query: query.to_string(),
            found: entry.is_some(),
            entry: entry.map(JsonEntry::from_entry),
            suggestions: suggestions
                .iter()
                .map(JsonSuggestion::from_suggestion)
                .collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Serialize `value` to `writer`, followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
