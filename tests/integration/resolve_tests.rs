use std::fs::{self, File};
use std::path::Path;

use tempfile::{tempdir, TempDir};
use trackcache::cache::{CacheEntry, CacheResolver, Resolution, ResolveError, ResolverConfig};
use trackcache::retrieval::DisabledFetcher;
use trackcache::scanner::{ScanError, WalkerConfig};

fn library(names: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    for name in names {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }
    dir
}

fn resolver(root: &Path) -> CacheResolver {
    CacheResolver::new(ResolverConfig::new(root), DisabledFetcher)
}

#[test]
fn test_resolve_exact_found() {
    let dir = library(&["Daft Punk - One More Time.mp3", "Interstellar Theme.mp3"]);

    let resolution = resolver(dir.path())
        .resolve_exact("Daft Punk - One More Time")
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::Found(CacheEntry::new(
            dir.path().join("Daft Punk - One More Time.mp3")
        ))
    );
}

#[test]
fn test_resolve_exact_not_found() {
    let dir = library(&["Daft Punk - One More Time.mp3", "Interstellar Theme.mp3"]);

    let resolution = resolver(dir.path()).resolve_exact("Nonexistent Song").unwrap();

    assert_eq!(resolution, Resolution::NotFound);
}

#[test]
fn test_resolve_exact_is_case_sensitive() {
    let dir = library(&["Interstellar Theme.mp3"]);

    let resolution = resolver(dir.path()).resolve_exact("interstellar theme").unwrap();

    assert_eq!(resolution, Resolution::NotFound);
}

#[test]
fn test_resolve_exact_in_subdirectory() {
    let dir = library(&["Albums/Discovery/Digital Love.mp3"]);

    let entry = resolver(dir.path())
        .resolve_exact("Digital Love")
        .unwrap()
        .into_entry()
        .unwrap();

    assert!(entry.path().ends_with("Albums/Discovery/Digital Love.mp3"));
}

#[test]
fn test_resolve_exact_duplicate_titles_first_wins() {
    let dir = library(&["a/Song.mp3", "b/Song.mp3"]);
    let resolver = resolver(dir.path());

    for _ in 0..3 {
        let entry = resolver.resolve_exact("Song").unwrap().into_entry().unwrap();
        assert_eq!(entry.path(), dir.path().join("a").join("Song.mp3"));
    }
}

#[test]
fn test_resolve_exact_matches_title_of_every_scanned_entry() {
    let dir = library(&[
        "Song.live.mp3",
        "Albums/x/Tune (Remix).mp3",
        "Plain.MP3",
    ]);
    let resolver = resolver(dir.path());

    for hit in resolver.search("").unwrap().matches {
        let title = hit.entry.title();
        let found = resolver.resolve_exact(&title).unwrap();
        assert!(found.is_found(), "title {:?} did not resolve", title);
    }
}

#[test]
fn test_resolve_exact_title_strips_only_last_extension() {
    let dir = library(&["Song.live.mp3"]);
    let resolver = resolver(dir.path());

    assert!(resolver.resolve_exact("Song.live").unwrap().is_found());
    assert!(!resolver.resolve_exact("Song").unwrap().is_found());
}

#[test]
fn test_resolve_exact_normalizes_decomposed_names() {
    // "é" as e + combining acute
    let dir = library(&["Beyonce\u{301}.mp3"]);

    let resolution = resolver(dir.path()).resolve_exact("Beyonc\u{e9}").unwrap();

    assert!(resolution.is_found());
}

#[test]
fn test_resolve_exact_missing_root() {
    let dir = tempdir().unwrap();

    let resolution = resolver(&dir.path().join("gone")).resolve_exact("Song").unwrap();

    assert_eq!(resolution, Resolution::NotFound);
}

#[cfg(unix)]
#[test]
fn test_resolve_exact_strict_mode_fails_on_unreadable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = library(&["Locked/Song.mp3", "Song.mp3"]);
    let locked = dir.path().join("Locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let config = ResolverConfig::new(dir.path()).with_walker(WalkerConfig::default().with_strict(true));
    let result = CacheResolver::new(config, DisabledFetcher).resolve_exact("Song");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(
        result,
        Err(ResolveError::Scan(ScanError::PermissionDenied(_)))
    ));
}

#[test]
fn test_suggest_for_typo() {
    let dir = library(&["Interstellar Theme.mp3", "Daft Punk - One More Time.mp3"]);

    let suggestions = resolver(dir.path()).suggest("Interstelar Theme", 3).unwrap();

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].entry.title(), "Interstellar Theme");
    assert!(suggestions[0].similarity > 0.9);
}
