use std::fs::File;

use clap::Parser;
use figment::Jail;
use tempfile::tempdir;
use trackcache::cli::Cli;
use trackcache::error::ExitCode;
use trackcache::run_app;

/// Parse and run one invocation, with no config file.
fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["trackcache", "--no-color", "--config", "none.toml"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_run_search_exit_codes() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("Daft Punk - One More Time.mp3")).unwrap();
    File::create(dir.path().join("Interstellar Theme.mp3")).unwrap();
    let root = dir.path().to_str().unwrap().to_string();

    Jail::expect_with(|_jail| {
        let hit = run(&["--music-dir", &root, "search", "daft"]).unwrap();
        assert_eq!(hit, ExitCode::Success);

        let miss = run(&["--music-dir", &root, "search", "zzzz", "--output", "json"]).unwrap();
        assert_eq!(miss, ExitCode::NotFound);
        Ok(())
    });
}

#[test]
fn test_run_resolve_exit_codes() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("Interstellar Theme.mp3")).unwrap();
    let root = dir.path().to_str().unwrap().to_string();

    Jail::expect_with(|_jail| {
        let found = run(&["--music-dir", &root, "resolve", "Interstellar Theme"]).unwrap();
        assert_eq!(found, ExitCode::Success);

        let missing = run(&[
            "--music-dir",
            &root,
            "resolve",
            "Interstelar Theme",
            "--suggest",
            "3",
        ])
        .unwrap();
        assert_eq!(missing, ExitCode::NotFound);
        Ok(())
    });
}

#[test]
fn test_run_music_dir_from_env() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("Interstellar Theme.mp3")).unwrap();

    Jail::expect_with(|jail| {
        jail.set_env("TRACKCACHE_MUSIC_DIR", dir.path().to_str().unwrap());

        let code = run(&["resolve", "Interstellar Theme", "--output", "json"]).unwrap();
        assert_eq!(code, ExitCode::Success);
        Ok(())
    });
}

#[test]
fn test_run_without_music_dir_is_general_error() {
    Jail::expect_with(|_jail| {
        let err = run(&["search", "x"]).unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
        assert!(format!("{err:#}").contains("No music directory"));
        Ok(())
    });
}

#[test]
fn test_run_fetch_cached_track() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("Interstellar Theme.mp3")).unwrap();
    let root = dir.path().to_str().unwrap().to_string();

    Jail::expect_with(|jail| {
        // Would fail if it ran
        jail.set_env("TRACKCACHE_FETCH__PROGRAM", "/nonexistent/fetch-tool");

        let code = run(&["--music-dir", &root, "fetch", "Interstellar Theme"]).unwrap();
        assert_eq!(code, ExitCode::Success);
        Ok(())
    });
}

#[test]
fn test_run_fetch_failure_is_retrieval_failed() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap().to_string();

    Jail::expect_with(|jail| {
        jail.set_env("TRACKCACHE_FETCH__PROGRAM", "/nonexistent/fetch-tool");

        let err = run(&["--music-dir", &root, "fetch", "Nonexistent Song"]).unwrap_err();

        assert_eq!(ExitCode::for_error(&err), ExitCode::RetrievalFailed);
        assert!(format!("{err:#}").contains("Nonexistent Song"));
        Ok(())
    });
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_run_search_partial_success() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    File::create(dir.path().join("Visible.mp3")).unwrap();
    let locked = dir.path().join("Locked");
    fs::create_dir(&locked).unwrap();
    File::create(locked.join("Hidden.mp3")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let root = dir.path().to_str().unwrap().to_string();
    let mut code = None;
    Jail::expect_with(|_jail| {
        code = Some(run(&["--music-dir", &root, "search", "visible"]).unwrap());
        Ok(())
    });
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(code, Some(ExitCode::PartialSuccess));
}
