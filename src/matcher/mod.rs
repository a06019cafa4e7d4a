//! Fuzzy ranking of candidate paths against free-text queries.
//!
//! # Overview
//!
//! [`FuzzyMatcher`] folds the query and every candidate (case, diacritics,
//! compatibility forms), keeps the candidates that contain the query as an
//! ordered subsequence, and sorts them best first.
//!
//! Each candidate is scored twice:
//! - against its file name: weighted ×2 when the query matches it
//! - against its path relative to the matcher's base directory
//!
//! so that typing a track name dominates while directory names still work.
//! Ties are broken by path so repeated calls give identical order.
//!
//! An empty query (or one that folds to nothing) returns every candidate,
//! ordered by path, each with [`scoring::BASE_SCORE`].
//!
//! # Example
//!
//! ```
//! use trackcache::matcher::FuzzyMatcher;
//! use std::path::PathBuf;
//!
//! let candidates = vec![
//!     PathBuf::from("/music/Interstellar Theme.mp3"),
//!     PathBuf::from("/music/Daft Punk - One More Time.mp3"),
//! ];
//! let matcher = FuzzyMatcher::new().with_base("/music");
//! let ranked = matcher.rank("onemoretime", &candidates);
//!
//! assert_eq!(ranked.len(), 1);
//! assert_eq!(ranked[0].path, candidates[1]);
//! ```

pub mod scoring;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::scanner::path_utils::{fold_for_match, relative_str};

pub use scoring::{find_match_positions, score_chars, BASE_SCORE};

/// Candidate sets smaller than this are scored on the calling thread.
const PARALLEL_THRESHOLD: usize = 512;

/// A candidate path with its match score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPath {
    /// The candidate path, exactly as supplied.
    pub path: PathBuf,
    /// Higher is better.
    pub score: u32,
}

/// Ranks candidate paths against a query.
///
/// Stateless apart from the optional base directory; safe to share.
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    base: Option<PathBuf>,
}

impl FuzzyMatcher {
    /// Create a matcher that scores candidates against their full path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Score candidates against their path relative to `base`.
    ///
    /// Keeps the music directory's own name from matching every query.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Rank candidates against `query`, best first.
    ///
    /// Candidates that do not contain the folded query as an ordered
    /// subsequence are left out.
    #[must_use]
    pub fn rank(&self, query: &str, candidates: &[PathBuf]) -> Vec<RankedPath> {
        let folded: Vec<char> = fold_for_match(query).chars().collect();

        if folded.is_empty() {
            let mut all: Vec<RankedPath> = candidates
                .iter()
                .map(|path| RankedPath {
                    path: path.clone(),
                    score: BASE_SCORE,
                })
                .collect();
            all.sort_by(|a, b| a.path.cmp(&b.path));
            return all;
        }

        let score_one = |path: &PathBuf| {
            self.score(&folded, path).map(|score| RankedPath {
                path: path.clone(),
                score,
            })
        };

        let mut results: Vec<RankedPath> = if candidates.len() >= PARALLEL_THRESHOLD {
            candidates.par_iter().filter_map(score_one).collect()
        } else {
            candidates.iter().filter_map(score_one).collect()
        };

        // Sort by descending score, then by path
        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));

        log::trace!(
            "Ranked {} of {} candidates for '{}'",
            results.len(),
            candidates.len(),
            query
        );

        results
    }

    /// Check whether `query` matches `candidate` at all.
    #[must_use]
    pub fn matches(&self, query: &str, candidate: &Path) -> bool {
        let folded: Vec<char> = fold_for_match(query).chars().collect();
        folded.is_empty() || self.score(&folded, candidate).is_some()
    }

    fn score(&self, folded_query: &[char], path: &Path) -> Option<u32> {
        let name_score = path.file_name().and_then(|name| {
            let name: Vec<char> = fold_for_match(&name.to_string_lossy()).chars().collect();
            score_chars(folded_query, &name)
        });

        let relative = relative_str(path, self.base.as_deref());
        let path_chars: Vec<char> = fold_for_match(&relative).chars().collect();
        let path_score = score_chars(folded_query, &path_chars);

        match (name_score, path_score) {
            (Some(ns), Some(ps)) => Some(ns.saturating_mul(2).saturating_add(ps)),
            (Some(ns), None) => Some(ns.saturating_mul(2)),
            (None, Some(ps)) => Some(ps),
            (None, None) => None,
        }
    }
}
