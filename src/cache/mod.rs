//! The local track cache.
//!
//! There is no stored index: the cache is whatever audio files currently
//! live under the music directory. [`CacheResolver`] answers queries by
//! scanning that directory fresh every time, and falls back to a
//! [`Fetcher`](crate::retrieval::Fetcher) when an exact title is missing.
//!
//! - [`entry`]: [`CacheEntry`], [`RankedMatch`] and the path-to-title codec
//! - [`resolver`]: search, exact resolution, fetch-and-resolve

pub mod entry;
pub mod resolver;

pub use entry::{extension_of, title_of, CacheEntry, RankedMatch};
pub use resolver::{
    CacheResolver, Resolution, ResolveError, ResolverConfig, SearchResults, Suggestion,
};
