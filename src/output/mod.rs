//! Output formatters for query results.
//!
//! - [`text`]: colored lines for terminals
//! - [`json`]: machine-readable objects for scripting
//!
//! # Example
//!
//! ```no_run
//! use trackcache::cache::{CacheResolver, ResolverConfig};
//! use trackcache::error::ExitCode;
//! use trackcache::output::json::{write_json, JsonSearchOutput};
//! use trackcache::retrieval::DisabledFetcher;
//!
//! let resolver = CacheResolver::new(ResolverConfig::new("/srv/music"), DisabledFetcher);
//! let results = resolver.search("theme").unwrap();
//!
//! let output = JsonSearchOutput::new("theme", &results, Some(10), ExitCode::Success);
//! write_json(&output, &mut std::io::stdout(), true).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{JsonLookupOutput, JsonOutputError, JsonSearchOutput};
