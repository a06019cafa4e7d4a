//! Human-readable output.
//!
//! Titles are bold, paths dim, scores and counts colored. Styling is turned
//! off globally through [`set_color`] (`--no-color` / `NO_COLOR`), and yansi
//! also drops it when stdout is not a terminal.

use std::io::{self, Write};
use std::path::Path;

use yansi::Paint;

use crate::cache::{CacheEntry, SearchResults, Suggestion};
use crate::scanner::path_utils::relative_str;
use crate::scanner::ScanSummary;

/// Enable or disable colored output for the whole process.
pub fn set_color(enabled: bool) {
    if enabled {
        yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    } else {
        yansi::disable();
    }
}

/// Write ranked search hits, one per line, paths relative to `root`.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_search<W: Write>(
    writer: &mut W,
    results: &SearchResults,
    root: &Path,
    limit: Option<usize>,
) -> io::Result<()> {
    let limit = limit.unwrap_or(usize::MAX);
    for hit in results.matches.iter().take(limit) {
        writeln!(
            writer,
            "{:>6}  {}  {}",
            hit.score.cyan(),
            hit.entry.title().bold(),
            relative_str(hit.entry.path(), Some(root)).dim()
        )?;
    }

    let shown = results.matches.len().min(limit);
    if shown < results.matches.len() {
        writeln!(
            writer,
            "{}",
            format!("... {} more", results.matches.len() - shown).dim()
        )?;
    }
    Ok(())
}

/// Write a found (or fetched) track.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_entry<W: Write>(writer: &mut W, entry: &CacheEntry) -> io::Result<()> {
    writeln!(writer, "{}", entry.path().display())
}

/// Write "did you mean" hints for a missing title.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_not_found<W: Write>(
    writer: &mut W,
    title: &str,
    suggestions: &[Suggestion],
) -> io::Result<()> {
    writeln!(writer, "{} {}", "Not cached:".red().bold(), title)?;
    if suggestions.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Did you mean:")?;
    for suggestion in suggestions {
        writeln!(
            writer,
            "  {}  {}",
            suggestion.entry.title().bold(),
            format!("({:.0}%)", suggestion.similarity * 100.0).dim()
        )?;
    }
    Ok(())
}

/// Write a one-line summary of skipped entries, if there were any.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_scan_warnings<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    if let Some(reason) = &summary.unavailable {
        writeln!(writer, "{} {}", "warning:".yellow().bold(), reason)?;
    }
    if !summary.errors.is_empty() {
        writeln!(
            writer,
            "{} skipped {} unreadable entr{} (use -v for details)",
            "warning:".yellow().bold(),
            summary.errors.len(),
            if summary.errors.len() == 1 { "y" } else { "ies" }
        )?;
    }
    if summary.interrupted {
        writeln!(writer, "{} scan interrupted", "warning:".yellow().bold())?;
    }
    Ok(())
}
