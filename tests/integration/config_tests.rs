use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::Serialized;
use figment::Jail;
use trackcache::config::{Config, ConfigError};

#[test]
fn test_config_defaults_without_env() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.fetch.audio_format, "mp3");
}

#[test]
fn test_config_from_toml_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "trackcache.toml",
            r#"
                music_dir = "/srv/music"
                extensions = ["mp3", "flac"]
                skip_hidden = true
                ignore_patterns = ["incoming/"]

                [fetch]
                program = "/opt/bin/yt-dlp"
                timeout_secs = 120
            "#,
        )?;

        let config = Config::load(Some(Path::new("trackcache.toml"))).unwrap();

        assert_eq!(config.music_dir, Some(PathBuf::from("/srv/music")));
        assert_eq!(config.extensions, vec!["mp3", "flac"]);
        assert!(config.skip_hidden);
        assert_eq!(config.ignore_patterns, vec!["incoming/"]);
        assert_eq!(config.fetch.program, "/opt/bin/yt-dlp");
        assert_eq!(config.fetch.timeout_secs, 120);
        // Unset keys keep their defaults
        assert_eq!(config.fetch.audio_format, "mp3");
        assert!(!config.strict);
        Ok(())
    });
}

#[test]
fn test_config_missing_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = Config::load(Some(Path::new("does-not-exist.toml"))).unwrap();
        assert_eq!(config, Config::default());
        Ok(())
    });
}

#[test]
fn test_config_malformed_file_is_error() {
    Jail::expect_with(|jail| {
        jail.create_file("bad.toml", "extensions = 42")?;

        let result = Config::load(Some(Path::new("bad.toml")));

        assert!(matches!(result, Err(ConfigError::Load(_))));
        Ok(())
    });
}

#[test]
fn test_config_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "trackcache.toml",
            r#"
                music_dir = "/from/file"
                [fetch]
                timeout_secs = 120
            "#,
        )?;
        jail.set_env("TRACKCACHE_MUSIC_DIR", "/from/env");
        jail.set_env("TRACKCACHE_STRICT", "true");
        // Use double underscore for nesting
        jail.set_env("TRACKCACHE_FETCH__TIMEOUT_SECS", "30");

        let config = Config::load(Some(Path::new("trackcache.toml"))).unwrap();

        assert_eq!(config.music_dir, Some(PathBuf::from("/from/env")));
        assert!(config.strict);
        assert_eq!(config.fetch.timeout_secs, 30);
        Ok(())
    });
}

#[test]
fn test_config_legacy_musicdir() {
    Jail::expect_with(|jail| {
        jail.set_env("MUSICDIR", "/legacy/music");

        let config = Config::load(Some(Path::new("none.toml"))).unwrap();
        assert_eq!(config.music_dir, Some(PathBuf::from("/legacy/music")));

        // The prefixed variable wins
        jail.set_env("TRACKCACHE_MUSIC_DIR", "/new/music");
        let config = Config::load(Some(Path::new("none.toml"))).unwrap();
        assert_eq!(config.music_dir, Some(PathBuf::from("/new/music")));
        Ok(())
    });
}

#[test]
fn test_config_cli_overrides_win() {
    Jail::expect_with(|jail| {
        jail.set_env("TRACKCACHE_MUSIC_DIR", "/from/env");

        let config = trackcache::apply_overrides(
            Config::load(Some(Path::new("none.toml"))).unwrap(),
            Some(PathBuf::from("/from/cli")),
            Some(Duration::from_secs(5)),
        );

        assert_eq!(config.music_dir, Some(PathBuf::from("/from/cli")));
        assert_eq!(config.fetch_config().timeout, Duration::from_secs(5));
        Ok(())
    });
}

#[test]
fn test_config_validation_reaches_resolver() {
    Jail::expect_with(|jail| {
        jail.set_env("TRACKCACHE_FETCH__TIMEOUT_SECS", "0");
        jail.set_env("TRACKCACHE_MUSIC_DIR", "/srv/music");

        let config = Config::load(Some(Path::new("none.toml"))).unwrap();

        assert!(matches!(
            trackcache::resolver_from_config(&config),
            Err(ConfigError::InvalidTimeout)
        ));
        Ok(())
    });
}
