//! Application configuration management.
//!
//! Configuration is layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config <PATH>`, or `config.toml` in the
//!    platform config directory)
//! 3. The legacy `MUSICDIR` environment variable (music directory only)
//! 4. `TRACKCACHE_*` environment variables; nested keys use `__`,
//!    e.g. `TRACKCACHE_FETCH__TIMEOUT_SECS=60`
//! 5. CLI flags, applied by the caller on the loaded value
//!
//! The loaded [`Config`] is turned into explicit values
//! ([`ResolverConfig`], [`FetchConfig`]) before it reaches the core; nothing
//! below this module reads the environment.
//!
//! # Example file
//!
//! ```toml
//! music_dir = "/srv/music"
//! extensions = ["mp3", "flac"]
//! skip_hidden = true
//! ignore_patterns = ["incoming/"]
//!
//! [fetch]
//! program = "yt-dlp"
//! audio_format = "mp3"
//! timeout_secs = 120
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::ResolverConfig;
use crate::retrieval::ytdlp::{DEFAULT_AUDIO_FORMAT, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use crate::retrieval::{FetchConfig, YtDlpFetcher};
use crate::scanner::{WalkerConfig, DEFAULT_AUDIO_EXTENSIONS};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TRACKCACHE_";

/// Legacy environment variable naming the music directory.
pub const LEGACY_MUSIC_DIR_ENV: &str = "MUSICDIR";

/// Errors from loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be parsed or has the wrong shape.
    #[error("Invalid configuration: {0}")]
    Load(Box<figment::Error>),

    /// No music directory was configured.
    #[error("No music directory configured (set music_dir, MUSICDIR, or --music-dir)")]
    MissingMusicDir,

    /// The supported extension list is empty.
    #[error("At least one audio extension must be configured")]
    NoExtensions,

    /// The fetch timeout is zero.
    #[error("fetch.timeout_secs must be greater than zero")]
    InvalidTimeout,

    /// The fetch program is blank.
    #[error("fetch.program must not be empty")]
    EmptyProgram,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Settings for the external retrieval tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Program to run.
    pub program: String,
    /// Extra arguments placed before the generated ones.
    pub extra_args: Vec<String>,
    /// Audio format to extract.
    pub audio_format: String,
    /// Upper bound on a single fetch, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            extra_args: Vec::new(),
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the local track cache.
    pub music_dir: Option<PathBuf>,
    /// Audio extensions visible to the cache.
    pub extensions: Vec<String>,
    /// Follow symbolic links while scanning.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from scans.
    pub ignore_patterns: Vec<String>,
    /// Abort a scan on the first unreadable entry.
    pub strict: bool,
    /// Retrieval tool settings.
    pub fetch: FetchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_dir: None,
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            strict: false,
            fetch: FetchSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from all layers.
    ///
    /// `config_path` overrides the platform default file location. A
    /// missing file is not an error; a malformed one is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);
        Self::figment(path.as_deref()).extract().map_err(ConfigError::from)
    }

    /// The layered figment behind [`Config::load`].
    #[must_use]
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = config_path {
            log::debug!("Reading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(
                Env::raw()
                    .only(&[LEGACY_MUSIC_DIR_ENV])
                    .map(|_| "music_dir".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "trackcache", "trackcache")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check the values for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.walker_config().extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.fetch.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        Ok(())
    }

    /// The configured music directory.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingMusicDir`] when none is set or it is blank.
    pub fn music_dir(&self) -> Result<&Path, ConfigError> {
        self.music_dir
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingMusicDir)
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_extensions(&self.extensions)
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
            .with_ignore_patterns(self.ignore_patterns.clone())
            .with_strict(self.strict)
    }

    /// Resolver settings derived from this configuration.
    ///
    /// # Errors
    ///
    /// Fails when validation fails or no music directory is set.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
        self.validate()?;
        let root = self.music_dir()?.to_path_buf();
        Ok(ResolverConfig::new(root).with_walker(self.walker_config()))
    }

    /// Retrieval tool settings derived from this configuration.
    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            program: self.fetch.program.clone(),
            extra_args: self.fetch.extra_args.clone(),
            audio_format: self.fetch.audio_format.clone(),
            timeout: Duration::from_secs(self.fetch.timeout_secs),
        }
    }

    /// The external-tool fetcher these settings describe.
    #[must_use]
    pub fn fetcher(&self) -> YtDlpFetcher {
        YtDlpFetcher::new(self.fetch_config())
    }
}
