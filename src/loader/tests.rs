use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::*;
use crate::archive::tests::write_archive;
use crate::logging::Collector;

const MANIFEST: &str = "META-INF/MANIFEST.MF";

fn loader_with(threshold: Duration) -> (ArchiveLoader, Arc<Collector>) {
    let collector = Arc::new(Collector::new());
    let config = LoaderConfig::builder()
        .idle_threshold(threshold)
        .build()
        .unwrap();
    let loader = ArchiveLoader::new(config, collector.clone());
    (loader, collector)
}

/// Archive A has no Widget; archive B has Widget and a license.
fn setup_archives(dir: &Path) -> (PathBuf, PathBuf) {
    let a = write_archive(
        dir,
        "a.jar",
        &[
            (MANIFEST, b"Bundle-SymbolicName: a"),
            ("org/example/Gadget.class", b"gadget-a"),
        ],
    );
    let b = write_archive(
        dir,
        "b.jar",
        &[
            (MANIFEST, b"Bundle-SymbolicName: b"),
            ("org/example/Widget.class", b"widget-b"),
            ("org/example/Gadget.class", b"gadget-b"),
            ("LICENSE", b"MIT"),
        ],
    );
    (a, b)
}

#[test]
fn test_add_does_not_open() {
    let temp_dir = TempDir::new().unwrap();
    let (a, _) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);

    assert!(loader.add(&a).unwrap());
    assert_eq!(loader.state(&a), Some(ArchiveState::Closed));
    assert_eq!(loader.open_count(), 0);
    assert_eq!(loader.state(Path::new("unregistered.jar")), None);
}

#[test]
fn test_add_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);

    assert!(loader.add(&a).unwrap());
    assert!(loader.add(&b).unwrap());
    assert!(!loader.add(&a).unwrap());

    assert_eq!(loader.locations(), vec![a, b]);
}

#[test]
fn test_load_unit_from_later_archive() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, collector) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();

    let unit = loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(unit.name, "org.example.Widget");
    assert_eq!(unit.entry, "org/example/Widget.class");
    assert_eq!(unit.source, b);
    assert_eq!(unit.bytes, b"widget-b");

    // Both archives were visited and are now open
    assert_eq!(loader.state(&a), Some(ArchiveState::Open));
    assert_eq!(loader.state(&b), Some(ArchiveState::Open));
    assert!(collector.is_clean());
}

#[test]
fn test_first_registered_archive_wins() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();

    let unit = loader.load_unit("org.example.Gadget").unwrap();
    assert_eq!(unit.source, a);
    assert_eq!(unit.bytes, b"gadget-a");
    // The search stopped at the first hit
    assert_eq!(loader.state(&b), Some(ArchiveState::Closed));
}

#[test]
fn test_unit_not_found_is_not_reported() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, collector) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();

    let err = loader.load_unit("org.example.Missing").unwrap_err();
    assert!(matches!(err, StevedoreError::UnitNotFound { ref name } if name == "org.example.Missing"));
    assert!(err.is_not_found());
    assert!(collector.is_clean());
}

#[test]
fn test_corrupt_archive_is_reported_and_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let corrupt = temp_dir.path().join("corrupt.jar");
    std::fs::write(&corrupt, b"not a zip").unwrap();

    let (loader, collector) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&corrupt).unwrap();
    loader.add(&b).unwrap();

    let unit = loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(unit.source, b);
    assert!(collector.check("while loading org/example/Widget.class from"));
    assert!(collector.check("corrupt.jar"));
    assert_eq!(loader.state(&corrupt), Some(ArchiveState::Closed));
}

#[test]
fn test_missing_archive_is_retried_on_every_lookup() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let missing = temp_dir.path().join("foobar");

    let (loader, collector) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&missing).unwrap();
    loader.add(&b).unwrap();

    loader.load_unit("org.example.Widget").unwrap();
    loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(collector.errors().len(), 2);

    // Once the archive appears it is picked up without re-registering
    std::fs::copy(&b, &missing).unwrap();
    let unit = loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(unit.source, missing);
    assert_eq!(collector.errors().len(), 2);
}

#[test]
fn test_purge_closes_idle_and_reopens_on_demand() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(Duration::from_millis(100));
    loader.add(&b).unwrap();

    loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(loader.state(&b), Some(ArchiveState::Open));

    thread::sleep(Duration::from_millis(150));
    assert_eq!(loader.purge(Instant::now()), 1);
    assert_eq!(loader.state(&b), Some(ArchiveState::Closed));
    // Closing never unregisters
    assert_eq!(loader.locations(), vec![b.clone()]);

    let unit = loader.load_unit("org.example.Gadget").unwrap();
    assert_eq!(unit.bytes, b"gadget-b");
    assert_eq!(loader.state(&b), Some(ArchiveState::Open));
}

#[test]
fn test_purge_keeps_recently_used_archives() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(Duration::from_millis(50));
    // b first, so loading the Widget touches only b
    loader.add(&b).unwrap();
    loader.add(&a).unwrap();

    let resource = loader.get_resource("/LICENSE").unwrap().unwrap();
    assert_eq!(resource.name, "LICENSE");
    loader.load_unit("org.example.Missing").unwrap_err();
    assert_eq!(loader.open_count(), 2);

    thread::sleep(Duration::from_millis(80));
    loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(loader.purge(Instant::now()), 1);

    assert_eq!(loader.state(&a), Some(ArchiveState::Closed));
    assert_eq!(loader.state(&b), Some(ArchiveState::Open));
}

#[test]
fn test_purge_with_explicit_clock() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(Duration::from_secs(60));
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();
    loader.load_unit("org.example.Widget").unwrap();

    assert_eq!(loader.purge(Instant::now()), 0);
    assert_eq!(loader.open_count(), 2);
    assert_eq!(loader.purge(Instant::now() + Duration::from_secs(61)), 2);
    assert_eq!(loader.open_count(), 0);
    // Purging closed archives is a no-op
    assert_eq!(loader.purge(Instant::now() + Duration::from_secs(120)), 0);
}

#[test]
fn test_get_resources_across_archives() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();

    let manifests = loader.get_resources(MANIFEST).unwrap();
    assert_eq!(manifests.len(), 1);

    loader.add(&b).unwrap();
    let manifests = loader.get_resources(MANIFEST).unwrap();
    let sources: Vec<&Path> = manifests.iter().map(|r| r.source.as_path()).collect();
    assert_eq!(sources, vec![a.as_path(), b.as_path()]);
    assert_eq!(manifests[1].bytes, b"Bundle-SymbolicName: b");

    let first = loader.get_resource(MANIFEST).unwrap().unwrap();
    assert_eq!(first.source, a);
    assert!(loader.get_resource("nope.txt").unwrap().is_none());
    assert!(loader.get_resources("nope.txt").unwrap().is_empty());
}

#[test]
fn test_remove_unregisters_and_closes() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();
    loader.load_unit("org.example.Widget").unwrap();

    assert!(loader.remove(&b).unwrap());
    assert!(!loader.remove(&b).unwrap());
    assert_eq!(loader.locations(), vec![a.clone()]);
    assert_eq!(loader.state(&b), None);
    assert!(loader.load_unit("org.example.Widget").unwrap_err().is_not_found());

    // Re-adding places the archive at the end again
    assert!(loader.add(&b).unwrap());
    assert_eq!(loader.locations(), vec![a, b]);
}

#[test]
fn test_close_rejects_further_use() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.load_unit("org.example.Gadget").unwrap();
    assert_eq!(loader.open_count(), 1);

    loader.close();
    assert!(!loader.is_open());
    assert_eq!(loader.open_count(), 0);
    assert!(loader.locations().is_empty());

    assert!(matches!(loader.add(&b), Err(StevedoreError::LoaderClosed)));
    assert!(matches!(
        loader.load_unit("org.example.Gadget"),
        Err(StevedoreError::LoaderClosed)
    ));
    assert!(matches!(
        loader.get_resource(MANIFEST),
        Err(StevedoreError::LoaderClosed)
    ));
    assert!(matches!(
        loader.get_resources(MANIFEST),
        Err(StevedoreError::LoaderClosed)
    ));
    assert!(matches!(
        loader.autopurge(Duration::from_millis(10)),
        Err(StevedoreError::LoaderClosed)
    ));
    assert_eq!(loader.purge(Instant::now()), 0);

    // Closing again is harmless
    loader.close();
}

#[test]
fn test_autopurge_closes_idle_archives() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(Duration::from_millis(10));
    loader.add(&b).unwrap();

    assert!(loader.autopurge(Duration::from_millis(10)).unwrap());
    assert!(!loader.autopurge(Duration::from_millis(10)).unwrap());

    loader.load_unit("org.example.Widget").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while loader.state(&b) == Some(ArchiveState::Open) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(loader.state(&b), Some(ArchiveState::Closed));

    let unit = loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(unit.bytes, b"widget-b");

    loader.close();
    assert!(!loader.is_open());
}

#[test]
fn test_autopurge_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let config = LoaderConfig::builder()
        .idle_threshold(Duration::from_millis(10))
        .autopurge_interval(Some(Duration::from_millis(10)))
        .build()
        .unwrap();
    let loader = ArchiveLoader::new(config, Arc::new(Collector::new()));
    loader.add(&b).unwrap();

    // Already running
    assert!(!loader.autopurge(Duration::from_millis(10)).unwrap());

    loader.load_unit("org.example.Widget").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while loader.open_count() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(loader.open_count(), 0);
}

#[test]
fn test_zero_autopurge_interval_is_rejected() {
    let err = LoaderConfig::builder()
        .autopurge_interval(Some(Duration::ZERO))
        .build()
        .unwrap_err();
    assert!(matches!(err, StevedoreError::ConfigError { .. }));

    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    assert!(matches!(
        loader.autopurge(Duration::ZERO),
        Err(StevedoreError::ConfigError { .. })
    ));
}

#[test]
fn test_concurrent_lookups_are_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, collector) = loader_with(Duration::ZERO);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();

    thread::scope(|scope| {
        for i in 0..8 {
            let loader = &loader;
            let (a, b) = (&a, &b);
            scope.spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        let unit = loader.load_unit("org.example.Gadget").unwrap();
                        assert_eq!(&unit.source, a);
                        assert_eq!(unit.bytes, b"gadget-a");
                    } else {
                        let unit = loader.load_unit("org.example.Widget").unwrap();
                        assert_eq!(&unit.source, b);
                    }
                }
            });
        }

        // Aggressive purging alongside the lookups
        let loader = &loader;
        scope.spawn(move || {
            for _ in 0..200 {
                loader.purge(Instant::now() + Duration::from_secs(1));
                thread::yield_now();
            }
        });
    });

    assert!(collector.is_clean());
}

#[test]
fn test_close_waits_for_concurrent_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let (a, b) = setup_archives(temp_dir.path());
    let (loader, _) = loader_with(DEFAULT_IDLE_THRESHOLD);
    loader.add(&a).unwrap();
    loader.add(&b).unwrap();

    thread::scope(|scope| {
        let loader = &loader;
        let worker = scope.spawn(move || {
            let mut outcomes = Vec::new();
            for _ in 0..200 {
                match loader.load_unit("org.example.Widget") {
                    Ok(unit) => assert_eq!(unit.bytes, b"widget-b"),
                    Err(err) => {
                        outcomes.push(err);
                        break;
                    }
                }
            }
            outcomes
        });

        thread::sleep(Duration::from_millis(5));
        loader.close();

        for err in worker.join().unwrap() {
            assert!(matches!(err, StevedoreError::LoaderClosed));
        }
    });

    assert_eq!(loader.open_count(), 0);
}

#[test]
fn test_purge_closes_idle_archive_while_state_is_polled() {
    let temp_dir = TempDir::new().unwrap();
    let (a, _) = setup_archives(temp_dir.path());
    let (loader, collector) = loader_with(Duration::from_millis(1));
    loader.add(&a).unwrap();

    let stop = AtomicBool::new(false);
    let mut missed = 0;
    thread::scope(|scope| {
        let (loader, stop, a) = (&loader, &stop, &a);
        scope.spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                loader.state(a);
            }
        });

        for _ in 0..500 {
            assert!(loader.get_resource(MANIFEST).unwrap().is_some());
            if loader.purge(Instant::now() + Duration::from_secs(3600)) != 1 {
                missed += 1;
            }
        }
        stop.store(true, Ordering::Relaxed);
    });

    assert_eq!(missed, 0);
    assert_eq!(loader.state(&a), Some(ArchiveState::Closed));
    assert!(collector.is_clean());
}

fn jdk_parent(name: &str) -> Option<Unit> {
    name.starts_with("java.").then(|| Unit {
        name: name.to_string(),
        entry: crate::archive::unit_entry_name(name),
        source: PathBuf::from("jrt:/java.base"),
        bytes: b"boot".to_vec(),
    })
}

fn loader_with_parent() -> (ArchiveLoader, Arc<Collector>) {
    let collector = Arc::new(Collector::new());
    let loader = ArchiveLoader::with_parent(
        LoaderConfig::default(),
        collector.clone(),
        Arc::new(jdk_parent),
    );
    (loader, collector)
}

#[test]
fn test_parent_resolves_with_no_archives() {
    let (loader, collector) = loader_with_parent();
    assert!(loader.locations().is_empty());

    let unit = loader.load_unit("java.lang.String").unwrap();
    assert_eq!(unit.entry, "java/lang/String.class");
    assert_eq!(unit.source, PathBuf::from("jrt:/java.base"));

    let err = loader.load_unit("org.example.Widget").unwrap_err();
    assert!(matches!(err, StevedoreError::UnitNotFound { ref name } if name == "org.example.Widget"));
    assert!(collector.is_clean());
}

#[test]
fn test_parent_is_asked_before_archives() {
    let temp_dir = TempDir::new().unwrap();
    let (_, b) = setup_archives(temp_dir.path());
    let shadow = write_archive(
        temp_dir.path(),
        "shadow.jar",
        &[("java/lang/String.class", b"shadowed")],
    );
    let (loader, _) = loader_with_parent();
    loader.add(&shadow).unwrap();
    loader.add(&b).unwrap();

    let unit = loader.load_unit("java.lang.String").unwrap();
    assert_eq!(unit.bytes, b"boot");
    // The parent answered, so no archive was opened
    assert_eq!(loader.open_count(), 0);

    // Names the parent does not know fall through to the archives
    let unit = loader.load_unit("org.example.Widget").unwrap();
    assert_eq!(unit.source, b);
    assert_eq!(unit.bytes, b"widget-b");
}

#[test]
fn test_closed_loader_ignores_parent() {
    let (loader, _) = loader_with_parent();
    loader.close();
    assert!(matches!(
        loader.load_unit("java.lang.String"),
        Err(StevedoreError::LoaderClosed)
    ));
}
