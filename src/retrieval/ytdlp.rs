//! Fetcher backed by an external download tool (yt-dlp by default).
//!
//! The tool is invoked as
//!
//! ```text
//! <program> [extra args] --quiet --extract-audio --audio-format <fmt>
//!     ytsearch:<query> -o <dest>/<safe query>.%(ext)s --exec echo
//! ```
//!
//! `--exec echo` makes the tool print the final file path once the audio has
//! been extracted; the last non-empty line of standard output is taken as
//! the result.
//!
//! The process is polled rather than blocked on, so a timeout or a shutdown
//! request can kill it. A killed process is always reaped before returning.
//! The timeout also bounds reading the tool's output, which a lingering
//! grandchild can hold open after the tool itself exits.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{Fetcher, RetrievalError};

/// Default program used for retrieval.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Default audio format requested from the tool.
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";

/// Default upper bound on a single fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// File stem used when the query sanitizes to nothing.
const FALLBACK_STEM: &str = "track";

/// Settings for [`YtDlpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the generated ones.
    pub extra_args: Vec<String>,
    /// Audio format to extract (also the resulting extension).
    pub audio_format: String,
    /// Kill the process if it runs longer than this.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            extra_args: Vec::new(),
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Runs the external download tool for each fetch.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    config: FetchConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl YtDlpFetcher {
    /// Create a fetcher with the given settings.
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            shutdown_flag: None,
        }
    }

    /// Kill the running process when this flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The settings this fetcher runs with.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Output template for the tool: `<dest>/<safe query>.%(ext)s`.
    #[must_use]
    pub fn output_template(&self, query: &str, dest: &Path) -> PathBuf {
        dest.join(format!("{}.%(ext)s", safe_file_stem(query)))
    }

    /// Full argument list for a query, excluding the program name.
    #[must_use]
    pub fn build_args(&self, query: &str, dest: &Path) -> Vec<String> {
        let mut args = self.config.extra_args.clone();
        args.extend([
            "--quiet".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            format!("ytsearch:{query}"),
            "-o".to_string(),
            self.output_template(query, dest).to_string_lossy().into_owned(),
            "--exec".to_string(),
            "echo".to_string(),
        ]);
        args
    }

    /// Wait for the child until `deadline`, killing it on timeout or shutdown.
    fn wait_bounded(
        &self,
        child: &mut Child,
        deadline: Instant,
    ) -> Result<std::process::ExitStatus, RetrievalError> {
        let program = &self.config.program;

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    terminate(child, program);
                    return Err(RetrievalError::Io {
                        program: program.clone(),
                        source,
                    });
                }
            }

            if self.is_shutdown_requested() {
                log::info!("Shutdown requested, terminating {}", program);
                terminate(child, program);
                return Err(RetrievalError::Cancelled {
                    program: program.clone(),
                });
            }

            if Instant::now() >= deadline {
                log::warn!(
                    "{} exceeded {:?}, terminating",
                    program,
                    self.config.timeout
                );
                terminate(child, program);
                return Err(RetrievalError::TimedOut {
                    program: program.clone(),
                    timeout: self.config.timeout,
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl Fetcher for YtDlpFetcher {
    fn fetch(&self, query: &str, dest: &Path) -> Result<PathBuf, RetrievalError> {
        let program = &self.config.program;
        let deadline = Instant::now() + self.config.timeout;
        let args = self.build_args(query, dest);
        log::info!("Fetching '{}' with {}", query, program);
        log::debug!("{} {:?}", program, args);

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RetrievalError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty tool cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        // A grandchild (ffmpeg) may keep the pipes open after the tool exits, so
        // reading them shares the same deadline. Readers past it are abandoned.
        let status = self.wait_bounded(&mut child, deadline)?;

        let Some(stdout) = collect(stdout, deadline) else {
            log::warn!("{} exited but its output stayed open past the timeout", program);
            return Err(RetrievalError::TimedOut {
                program: program.clone(),
                timeout: self.config.timeout,
            });
        };
        let stderr = collect(stderr, deadline).unwrap_or_default();

        if !status.success() {
            let stderr = stderr.trim().to_string();
            log::warn!("{} failed ({}): {}", program, status, stderr);
            return Err(RetrievalError::Failed {
                program: program.clone(),
                status,
                stderr,
            });
        }

        let path = parse_reported_path(&stdout).ok_or_else(|| RetrievalError::NoOutput {
            program: program.clone(),
        })?;
        log::info!("Fetched '{}' to {}", query, path.display());
        Ok(path)
    }
}

/// Turn a free-text query into a file stem that stays inside `dest`.
///
/// Path separators and reserved characters are removed, and `%` is escaped
/// for the tool's output template syntax.
#[must_use]
pub fn safe_file_stem(query: &str) -> String {
    let sanitized = sanitize_filename::sanitize(query.trim());
    let trimmed = sanitized.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.replace('%', "%%")
    }
}

/// The last non-empty line of the tool's output, as a path.
#[must_use]
pub fn parse_reported_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Everything read from a pipe, or `None` if it is still open at `deadline`.
fn collect(reader: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(rx) = reader else {
        return Some(String::new());
    };
    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
        .ok()
}

/// Kill and reap the child so it never outlives the fetch.
fn terminate(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        log::debug!("Kill of {} failed (likely already exited): {}", program, e);
    }
    if let Err(e) = child.wait() {
        log::warn!("Failed to reap {}: {}", program, e);
    }
}
