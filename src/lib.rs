//! trackcache - local music cache with fuzzy search and fetch on miss
//!
//! Audio files live in a plain directory tree. A track's title is its file
//! name without the extension. The crate answers three questions about that
//! tree: which files fuzzily match some text, which file has exactly this
//! title, and (when none does) how to get one by downloading it with an
//! external tool such as yt-dlp.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod retrieval;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use cache::{CacheResolver, Resolution};
use cli::{Cli, Commands, FetchArgs, OutputFormat, ResolveArgs, SearchArgs};
use config::Config;
use error::ExitCode;
use output::json::{write_json, JsonLookupOutput, JsonSearchOutput};
use output::text;

/// Run one CLI invocation and report how it ended.
///
/// Logging must already be initialized. Results go to stdout; warnings go
/// to stderr.
///
/// # Errors
///
/// Configuration problems, strict-mode scan failures and failed fetches are
/// returned as errors; [`ExitCode::for_error`] maps them to exit codes.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    text::set_color(!cli.no_color);

    let timeout = match &cli.command {
        Commands::Fetch(args) => args.timeout.map(Duration::from_secs),
        _ => None,
    };
    let config = apply_overrides(
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?,
        cli.music_dir.clone(),
        timeout,
    );

    let resolver_config = config.resolver_config()?;
    log::debug!("Music directory: {}", resolver_config.root.display());

    let handler = signal::install_handler()?;
    let fetcher = config.fetcher().with_shutdown_flag(handler.get_flag());
    let resolver =
        CacheResolver::new(resolver_config, fetcher).with_shutdown_flag(handler.get_flag());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let code = match &cli.command {
        Commands::Search(args) => handle_search(&resolver, args, &mut out)?,
        Commands::Resolve(args) => handle_resolve(&resolver, args, &mut out)?,
        Commands::Fetch(args) => handle_fetch(&resolver, args, &mut out)?,
    };

    if handler.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }
    Ok(code)
}

fn handle_search<W: Write>(
    resolver: &CacheResolver,
    args: &SearchArgs,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let results = resolver.search(&args.query)?;

    for err in &results.summary.errors {
        log::warn!("Skipped: {}", err);
    }

    let code = if results.summary.interrupted {
        ExitCode::Interrupted
    } else if results.matches.is_empty() {
        ExitCode::NotFound
    } else if !results.summary.is_complete() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    match args.output {
        OutputFormat::Json => {
            let output = JsonSearchOutput::new(&args.query, &results, args.limit, code);
            write_json(&output, out, true)?;
        }
        OutputFormat::Text => {
            text::write_search(out, &results, resolver.root(), args.limit)?;
            text::write_scan_warnings(&mut io::stderr(), &results.summary)?;
            if results.matches.is_empty() {
                log::info!("No tracks match '{}'", args.query);
            }
        }
    }

    Ok(code)
}

fn handle_resolve<W: Write>(
    resolver: &CacheResolver,
    args: &ResolveArgs,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let (resolution, summary) = resolver.lookup(&args.title)?;
    for err in &summary.errors {
        log::warn!("Skipped: {}", err);
    }

    let (entry, suggestions) = match resolution {
        Resolution::Found(entry) => (Some(entry), Vec::new()),
        Resolution::NotFound => (None, resolver.suggest(&args.title, args.suggest)?),
    };
    let code = if entry.is_some() {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    };

    match (args.output, &entry) {
        (OutputFormat::Json, _) => {
            let output = JsonLookupOutput::new(&args.title, entry.as_ref(), &suggestions, code);
            write_json(&output, out, true)?;
        }
        (OutputFormat::Text, Some(entry)) => text::write_entry(out, entry)?,
        (OutputFormat::Text, None) => {
            text::write_not_found(&mut io::stderr(), &args.title, &suggestions)?;
            text::write_scan_warnings(&mut io::stderr(), &summary)?;
        }
    }

    Ok(code)
}

fn handle_fetch<W: Write>(
    resolver: &CacheResolver,
    args: &FetchArgs,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let entry = resolver
        .fetch_and_resolve(&args.query)
        .with_context(|| format!("Could not get '{}'", args.query))?;

    match args.output {
        OutputFormat::Json => {
            let output = JsonLookupOutput::new(&args.query, Some(&entry), &[], ExitCode::Success);
            write_json(&output, out, true)?;
        }
        OutputFormat::Text => text::write_entry(out, &entry)?,
    }

    Ok(ExitCode::Success)
}

/// Build a resolver straight from a loaded [`Config`].
///
/// Convenience for library users that want the CLI's defaults without the
/// CLI: yt-dlp as fetcher, no shutdown flag.
///
/// # Errors
///
/// Fails when the configuration is invalid or names no music directory.
pub fn resolver_from_config(config: &Config) -> Result<CacheResolver, config::ConfigError> {
    Ok(CacheResolver::new(config.resolver_config()?, config.fetcher()))
}

/// Override the music directory and fetch timeout of a loaded config.
#[must_use]
pub fn apply_overrides(
    mut config: Config,
    music_dir: Option<PathBuf>,
    timeout: Option<Duration>,
) -> Config {
    if let Some(dir) = music_dir {
        config.music_dir = Some(dir);
    }
    if let Some(timeout) = timeout {
        config.fetch.timeout_secs = timeout.as_secs().max(1);
    }
    config
}
