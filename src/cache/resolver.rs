//! Cache resolution: fuzzy search, exact lookup, and fetch on miss.
//!
//! # Overview
//!
//! [`CacheResolver`] ties the scanner, the title codec, the fuzzy matcher
//! and a [`Fetcher`] together. It is constructed from an explicit
//! [`ResolverConfig`] and never consults the environment.
//!
//! Every operation rescans the music directory. The resolver holds no
//! mutable state, so one instance can serve concurrent queries.
//!
//! # Outcomes
//!
//! | Operation            | Success                      | Miss                     | Failure |
//! |----------------------|------------------------------|--------------------------|---------|
//! | `search`             | ranked matches (maybe empty) | n/a                      | `ScanError` (strict mode) |
//! | `resolve_exact`      | `Resolution::Found`          | `Resolution::NotFound`   | `Interrupted`, `Scan` |
//! | `fetch_and_resolve`  | entry (cached or fetched)    | n/a                      | `IncompleteScan`, `Retrieval` |
//!
//! Titles are compared in NFC, so a decomposed query finds the file it was
//! fetched under.
//!
//! # Example
//!
//! ```no_run
//! use trackcache::cache::{CacheResolver, Resolution, ResolverConfig};
//! use trackcache::retrieval::YtDlpFetcher;
//!
//! let resolver = CacheResolver::new(
//!     ResolverConfig::new("/srv/music"),
//!     YtDlpFetcher::default(),
//! );
//!
//! for hit in resolver.search("one more time").unwrap().matches {
//!     println!("{} ({})", hit.entry.title(), hit.score);
//! }
//!
//! match resolver.resolve_exact("Daft Punk - One More Time").unwrap() {
//!     Resolution::Found(entry) => println!("{}", entry.path().display()),
//!     Resolution::NotFound => println!("not cached"),
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::entry::{title_of, CacheEntry, RankedMatch};
use crate::matcher::FuzzyMatcher;
use crate::retrieval::{Fetcher, RetrievalError};
use crate::scanner::path_utils::{fold_for_match, normalize_path_str};
use crate::scanner::{ScanError, ScanOutcome, ScanSummary, Walker, WalkerConfig};

/// Minimum Jaro-Winkler similarity for a title to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Explicit configuration for a resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The music directory.
    pub root: PathBuf,
    /// Scanner settings.
    pub walker: WalkerConfig,
}

impl ResolverConfig {
    /// Configuration for `root` with default scanner settings.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            walker: WalkerConfig::default(),
        }
    }

    /// Replace the scanner settings.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }
}

/// Outcome of an exact title lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Resolution {
    /// A file with exactly this title exists.
    Found(CacheEntry),
    /// No file has this title.
    NotFound,
}

impl Resolution {
    /// True for [`Resolution::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The found entry, if any.
    #[must_use]
    pub fn into_entry(self) -> Option<CacheEntry> {
        match self {
            Self::Found(entry) => Some(entry),
            Self::NotFound => None,
        }
    }
}

/// Ranked search hits together with the status of the scan behind them.
#[derive(Debug, Default)]
pub struct SearchResults {
    /// Hits, best first.
    pub matches: Vec<RankedMatch>,
    /// How the scan went; check [`ScanSummary::is_complete`].
    pub summary: ScanSummary,
}

/// A title close to one that was not found.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The similar entry.
    pub entry: CacheEntry,
    /// Jaro-Winkler similarity of the folded titles, in `0.0..=1.0`.
    pub similarity: f64,
}

/// Errors surfaced by the resolver.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Scanning the music directory failed (strict mode only).
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    /// The external fetch failed.
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The scan stopped on a shutdown request, so a miss proves nothing.
    #[error("Scan interrupted before the lookup finished")]
    Interrupted,

    /// Entries were skipped, so the track may exist where the scan could not look.
    #[error("Not fetching '{title}': the scan skipped {skipped} unreadable entries")]
    IncompleteScan {
        /// The title that was not found
        title: String,
        /// Number of skipped entries
        skipped: usize,
    },
}

/// Answers search and lookup queries against the music directory.
#[derive(Clone)]
pub struct CacheResolver {
    config: ResolverConfig,
    matcher: FuzzyMatcher,
    fetcher: Arc<dyn Fetcher>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for CacheResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheResolver")
            .field("config", &self.config)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl CacheResolver {
    /// Create a resolver over `config.root` using `fetcher` for misses.
    #[must_use]
    pub fn new<F: Fetcher + 'static>(config: ResolverConfig, fetcher: F) -> Self {
        Self::with_shared_fetcher(config, Arc::new(fetcher))
    }

    /// Create a resolver with an already shared fetcher.
    #[must_use]
    pub fn with_shared_fetcher(config: ResolverConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let matcher = FuzzyMatcher::new().with_base(config.root.clone());
        Self {
            config,
            matcher,
            fetcher,
            shutdown_flag: None,
        }
    }

    /// Stop scans early when this flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The music directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn scan(&self) -> Result<ScanOutcome, ScanError> {
        let mut walker = Walker::new(&self.config.root, self.config.walker.clone());
        if let Some(flag) = &self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        walker.scan()
    }

    /// Rank every cached file against free text, best first.
    ///
    /// No hits is an empty result, not an error. An empty query lists every
    /// file.
    ///
    /// # Errors
    ///
    /// Only in strict mode, when an entry cannot be read.
    pub fn search(&self, query: &str) -> Result<SearchResults, ScanError> {
        let outcome = self.scan()?;
        let ranked = self.matcher.rank(query, &outcome.files);

        let matches: Vec<RankedMatch> = ranked
            .into_iter()
            .map(|hit| RankedMatch {
                entry: CacheEntry::new(hit.path),
                score: hit.score,
            })
            .collect();

        log::debug!(
            "Search '{}': {} of {} files matched",
            query,
            matches.len(),
            outcome.summary.total_files
        );

        Ok(SearchResults {
            matches,
            summary: outcome.summary,
        })
    }

    /// Find the file whose derived title equals `title` exactly.
    ///
    /// Comparison is case-sensitive, after both sides are normalized to NFC.
    /// When several files share the title, the first in traversal order wins.
    /// A miss in a scan that skipped entries is still `NotFound`; use
    /// [`CacheResolver::lookup`] to see the scan status.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Interrupted`] when the scan stopped on shutdown;
    /// [`ResolveError::Scan`] in strict mode when an entry cannot be read.
    pub fn resolve_exact(&self, title: &str) -> Result<Resolution, ResolveError> {
        self.lookup(title).map(|(resolution, _)| resolution)
    }

    /// [`CacheResolver::resolve_exact`] together with the status of the scan.
    ///
    /// # Errors
    ///
    /// As for [`CacheResolver::resolve_exact`].
    pub fn lookup(&self, title: &str) -> Result<(Resolution, ScanSummary), ResolveError> {
        let outcome = self.scan()?;
        if outcome.summary.interrupted {
            return Err(ResolveError::Interrupted);
        }
        let resolution = find_by_title(&outcome.files, title);
        Ok((resolution, outcome.summary))
    }

    /// Return the cached track for `query`, fetching it if absent.
    ///
    /// The query is first tried as an exact title. Only on a miss in a
    /// complete scan is the fetcher invoked, exactly once. The path the
    /// fetcher reports is wrapped directly if it exists; otherwise the
    /// directory is rescanned for its title.
    ///
    /// # Errors
    ///
    /// [`ResolveError::IncompleteScan`] when the miss comes from a scan that
    /// skipped entries; [`ResolveError::Retrieval`] when the fetch fails or
    /// its output cannot be found; [`ResolveError::Interrupted`] and
    /// [`ResolveError::Scan`] as for [`CacheResolver::resolve_exact`].
    pub fn fetch_and_resolve(&self, query: &str) -> Result<CacheEntry, ResolveError> {
        let (resolution, summary) = self.lookup(query)?;
        if let Resolution::Found(entry) = resolution {
            log::debug!("Cache hit for '{}': {}", query, entry.path().display());
            return Ok(entry);
        }
        if !summary.is_complete() {
            log::warn!(
                "'{}' not found, but {} entries were skipped; not fetching",
                query,
                summary.errors.len()
            );
            return Err(ResolveError::IncompleteScan {
                title: query.to_string(),
                skipped: summary.errors.len(),
            });
        }

        log::info!("'{}' not in cache, fetching", query);
        let reported = self.fetcher.fetch(query, &self.config.root)?;

        if reported.is_file() && self.config.walker.is_supported(&reported) {
            return Ok(CacheEntry::new(reported));
        }

        let title = title_of(&reported);
        log::debug!(
            "Reported path {} not usable as-is, rescanning for '{}'",
            reported.display(),
            title
        );
        match self.resolve_exact(&title)? {
            Resolution::Found(entry) => Ok(entry),
            Resolution::NotFound => Err(RetrievalError::MissingOutput(reported).into()),
        }
    }

    /// Titles similar to `title`, most similar first, at most `limit`.
    ///
    /// Meant for "did you mean" hints after a [`Resolution::NotFound`].
    ///
    /// # Errors
    ///
    /// Only in strict mode, when an entry cannot be read.
    pub fn suggest(&self, title: &str, limit: usize) -> Result<Vec<Suggestion>, ScanError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let outcome = self.scan()?;
        let wanted = fold_for_match(title);

        let mut suggestions: Vec<Suggestion> = outcome
            .files
            .into_iter()
            .filter_map(|path| {
                let similarity = strsim::jaro_winkler(&wanted, &fold_for_match(&title_of(&path)));
                (similarity >= SUGGESTION_THRESHOLD).then(|| Suggestion {
                    entry: CacheEntry::new(path),
                    similarity,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.entry.cmp(&b.entry))
        });
        suggestions.truncate(limit);
        Ok(suggestions)
    }
}

/// First path whose derived title equals `title` in NFC.
fn find_by_title(paths: &[PathBuf], title: &str) -> Resolution {
    let title = normalize_path_str(title);
    paths
        .iter()
        .find(|path| title_of(path) == title)
        .map_or(Resolution::NotFound, |path| {
            Resolution::Found(CacheEntry::new(path.clone()))
        })
}
