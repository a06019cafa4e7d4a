use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use trackcache::cache::{CacheResolver, ResolveError, ResolverConfig};
use trackcache::retrieval::{Fetcher, RetrievalError};

/// Writes `<dest>/<query>.<ext>` and reports it, counting calls.
struct WritingFetcher {
    extension: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Fetcher for WritingFetcher {
    fn fetch(&self, query: &str, dest: &Path) -> Result<PathBuf, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = dest.join(format!("{query}.{}", self.extension));
        File::create(&path).map_err(|source| RetrievalError::Io {
            program: "mock".to_string(),
            source,
        })?;
        Ok(path)
    }
}

/// Always fails with a tool-style error, counting calls.
struct FailingFetcher {
    calls: Arc<AtomicUsize>,
}

impl Fetcher for FailingFetcher {
    fn fetch(&self, _query: &str, _dest: &Path) -> Result<PathBuf, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RetrievalError::NoOutput {
            program: "mock".to_string(),
        })
    }
}

/// Writes the file under the query's name but reports some other path.
struct MisreportingFetcher {
    reported: PathBuf,
}

impl Fetcher for MisreportingFetcher {
    fn fetch(&self, query: &str, dest: &Path) -> Result<PathBuf, RetrievalError> {
        File::create(dest.join(format!("{query}.mp3"))).unwrap();
        Ok(self.reported.clone())
    }
}

fn library(names: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    for name in names {
        File::create(dir.path().join(name)).unwrap();
    }
    dir
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_fetch_hit_does_not_invoke_fetcher() {
    let dir = library(&["Interstellar Theme.mp3"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        FailingFetcher {
            calls: Arc::clone(&calls),
        },
    );

    let entry = resolver.fetch_and_resolve("Interstellar Theme").unwrap();

    assert_eq!(entry.path(), dir.path().join("Interstellar Theme.mp3"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_fetch_miss_writes_and_resolves() {
    let dir = library(&[]);
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        WritingFetcher {
            extension: "mp3",
            calls: Arc::clone(&calls),
        },
    );

    let entry = resolver.fetch_and_resolve("Daft Punk - One More Time").unwrap();

    assert_eq!(entry.title(), "Daft Punk - One More Time");
    assert_eq!(entry.extension(), ".mp3");
    assert!(entry.path().is_file());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Now cached: no second fetch
    let again = resolver.fetch_and_resolve("Daft Punk - One More Time").unwrap();
    assert_eq!(again, entry);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fetch_failure_surfaces_diagnostic_and_leaves_cache_unchanged() {
    let dir = library(&["Interstellar Theme.mp3"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        FailingFetcher {
            calls: Arc::clone(&calls),
        },
    );

    let err = resolver.fetch_and_resolve("Nonexistent Song").unwrap_err();

    match err {
        ResolveError::Retrieval(e) => assert!(!e.diagnostic().is_empty()),
        other => panic!("expected retrieval error, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(file_count(dir.path()), 1);
    assert!(!resolver.resolve_exact("Nonexistent Song").unwrap().is_found());

    let listed = resolver.search("").unwrap();
    assert_eq!(listed.matches.len(), 1);
    assert_eq!(listed.matches[0].entry.title(), "Interstellar Theme");
}

#[test]
fn test_fetch_decomposed_query_fetches_once() {
    let dir = library(&[]);
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        WritingFetcher {
            extension: "mp3",
            calls: Arc::clone(&calls),
        },
    );

    let first = resolver.fetch_and_resolve("Cafe\u{301} Del Mar").unwrap();
    let second = resolver.fetch_and_resolve("Cafe\u{301} Del Mar").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(first.title(), "Caf\u{e9} Del Mar");
    assert!(resolver.resolve_exact("Caf\u{e9} Del Mar").unwrap().is_found());
}

#[cfg(unix)]
#[test]
fn test_fetch_refused_when_scan_skipped_entries() {
    use std::os::unix::fs::PermissionsExt;

    let dir = library(&[]);
    let locked = dir.path().join("Locked");
    fs::create_dir(&locked).unwrap();
    File::create(locked.join("Song.mp3")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root ignores permission bits
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        WritingFetcher {
            extension: "mp3",
            calls: Arc::clone(&calls),
        },
    );

    let (resolution, summary) = resolver.lookup("Song").unwrap();
    let result = resolver.fetch_and_resolve("Song");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(!resolution.is_found());
    assert!(!summary.is_complete());
    match result {
        Err(ResolveError::IncompleteScan { title, skipped }) => {
            assert_eq!(title, "Song");
            assert_eq!(skipped, 1);
        }
        other => panic!("expected incomplete scan, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("Song.mp3").exists());
}

#[test]
fn test_fetch_unsupported_output_is_missing() {
    let dir = library(&[]);
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        WritingFetcher {
            extension: "webm",
            calls: Arc::new(AtomicUsize::new(0)),
        },
    );

    let err = resolver.fetch_and_resolve("Song").unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Retrieval(RetrievalError::MissingOutput(_))
    ));
}

#[test]
fn test_fetch_misreported_path_found_by_title() {
    let dir = library(&[]);
    let reported = dir.path().join("Song.webm");
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        MisreportingFetcher { reported },
    );

    let entry = resolver.fetch_and_resolve("Song").unwrap();

    assert_eq!(entry.path(), dir.path().join("Song.mp3"));
}

#[test]
fn test_fetch_reported_path_nowhere() {
    let dir = library(&[]);
    let resolver = CacheResolver::new(
        ResolverConfig::new(dir.path()),
        MisreportingFetcher {
            reported: dir.path().join("Different Title.mp3"),
        },
    );

    let err = resolver.fetch_and_resolve("Song").unwrap_err();

    match err {
        ResolveError::Retrieval(RetrievalError::MissingOutput(path)) => {
            assert!(path.ends_with("Different Title.mp3"));
        }
        other => panic!("expected missing output, got {other:?}"),
    }
}

#[cfg(unix)]
mod external_tool {
    use super::*;
    use std::time::Duration;
    use trackcache::retrieval::{FetchConfig, YtDlpFetcher};

    /// A stand-in for yt-dlp: `sh -c <script> sh <generated args...>`.
    ///
    /// The output template is the 7th generated argument.
    fn shell_fetcher(script: &str) -> YtDlpFetcher {
        YtDlpFetcher::new(FetchConfig {
            program: "sh".to_string(),
            extra_args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            audio_format: "mp3".to_string(),
            timeout: Duration::from_secs(10),
        })
    }

    #[test]
    fn test_external_tool_success() {
        let dir = library(&[]);
        let fetcher = shell_fetcher(
            r#"out=$(printf '%s' "$7" | sed 's/%(ext)s$/mp3/'); : > "$out"; echo "$out""#,
        );
        let resolver = CacheResolver::new(ResolverConfig::new(dir.path()), fetcher);

        let entry = resolver.fetch_and_resolve("Interstellar Theme").unwrap();

        assert_eq!(entry.path(), dir.path().join("Interstellar Theme.mp3"));
        assert!(entry.path().is_file());
    }

    #[test]
    fn test_external_tool_failure() {
        let dir = library(&[]);
        let fetcher = shell_fetcher("echo 'ERROR: no results' >&2; exit 1");
        let resolver = CacheResolver::new(ResolverConfig::new(dir.path()), fetcher);

        let err = resolver.fetch_and_resolve("Nonexistent Song").unwrap_err();

        match err {
            ResolveError::Retrieval(e @ RetrievalError::Failed { .. }) => {
                assert!(e.diagnostic().contains("no results"));
            }
            other => panic!("expected failed tool, got {other:?}"),
        }
        assert_eq!(file_count(dir.path()), 0);
        assert!(resolver.search("").unwrap().matches.is_empty());
    }
}
