use std::path::Path;
use tempfile::TempDir;

use diskbroom::cleaner::{Executor, Remover, SystemRemover};
use diskbroom::common::config::Config;
use diskbroom::junk::{CategorySpec, ItemSpec, JunkAnalyzer, ScanState};
use diskbroom::scanner::progress::{NoopObserver, ScanEvent};
use diskbroom::Engine;

struct PermanentOnly;

impl Remover for PermanentOnly {
    fn trash(&self, _path: &Path) -> Result<(), String> {
        Err("no trash in tests".into())
    }
    fn remove(&self, path: &Path) -> std::io::Result<()> {
        SystemRemover.remove(path)
    }
}

fn engine() -> Engine {
    let config = Config {
        max_workers: 2,
        ..Config::default()
    };
    Engine::new(config)
        .unwrap()
        .with_executor(Executor::new(PermanentOnly))
}

fn write(path: &Path, len: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![1u8; len]).unwrap();
}

fn item(name: &str, path: &Path, recommended: bool) -> ItemSpec {
    ItemSpec {
        name: name.to_string(),
        path: path.display().to_string(),
        recommended,
    }
}

/// Two categories: caches (both items recommended) and logs (not recommended)
fn catalog(root: &Path) -> Vec<CategorySpec> {
    write(&root.join("caches/app1/blob"), 1200);
    write(&root.join("caches/app2/blob"), 800);
    write(&root.join("logs/system.log"), 300);
    vec![
        CategorySpec {
            key: "caches".into(),
            name: "Caches".into(),
            description: String::new(),
            items: vec![
                item("App One", &root.join("caches/app1"), true),
                item("App Two", &root.join("caches/app2"), true),
            ],
        },
        CategorySpec {
            key: "logs".into(),
            name: "Logs".into(),
            description: String::new(),
            items: vec![item("System", &root.join("logs"), false)],
        },
    ]
}

// ─── Junk lifecycle ───────────────────────────────────────────────────────────

#[test]
fn test_junk_scan_then_clean_selection() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut analyzer = JunkAnalyzer::new(catalog(dir.path()));

    engine.analyze_junk(&mut analyzer, &NoopObserver);
    assert_eq!(analyzer.state(), ScanState::Summary);
    assert_eq!(analyzer.total(), 2300);
    assert_eq!(analyzer.selected_bytes(), 2000);

    let report = engine.delete_batch(analyzer.selected_paths());
    assert_eq!(report.bytes_freed, 2000);
    assert!(report.failures.is_empty());
    assert!(dir.path().join("caches/app1").is_dir());
    assert!(!dir.path().join("caches/app1/blob").exists());
    assert!(dir.path().join("logs/system.log").exists());

    // A rescan no longer sees the emptied caches
    engine.analyze_junk(&mut analyzer, &NoopObserver);
    assert_eq!(analyzer.total(), 300);
    assert_eq!(analyzer.selected_bytes(), 0);
}

#[test]
fn test_background_junk_scan() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut analyzer = JunkAnalyzer::new(catalog(dir.path()));

    let handle = engine.spawn_junk(&mut analyzer).unwrap();
    assert_eq!(analyzer.state(), ScanState::Scanning);
    let generation = handle.generation();
    let events = handle.events().clone();
    let categories = handle.wait().unwrap();

    assert!(events
        .try_iter()
        .any(|e| matches!(e, ScanEvent::Categories { .. }) && e.generation() == generation));
    assert!(analyzer.finish_scan(generation, categories));
    assert_eq!(analyzer.categories().len(), 2);
}

#[test]
fn test_superseded_junk_scan_is_discarded() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut analyzer = JunkAnalyzer::new(catalog(dir.path()));

    let first = engine.spawn_junk(&mut analyzer).unwrap();
    let second = engine.spawn_junk(&mut analyzer).unwrap();
    let stale_generation = first.generation();
    let stale = first.wait().unwrap();
    assert!(!analyzer.finish_scan(stale_generation, stale));
    assert_eq!(analyzer.state(), ScanState::Scanning);

    let fresh_generation = second.generation();
    let fresh = second.wait().unwrap();
    assert!(analyzer.finish_scan(fresh_generation, fresh));
    assert_eq!(analyzer.state(), ScanState::Summary);
}

#[test]
fn test_junk_handle_shares_engine_generations() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut analyzer = JunkAnalyzer::new(catalog(dir.path()));

    let dup = engine
        .spawn_duplicates(engine.duplicate_config(Some(vec![dir.path().to_path_buf()])))
        .unwrap();
    let junk = engine.spawn_junk(&mut analyzer).unwrap();
    assert!(junk.generation() > dup.generation());
    assert!(!engine.is_current(dup.generation()));
    assert!(engine.is_current(junk.generation()));
    assert_eq!(analyzer.generation(), junk.generation());

    let large = engine
        .spawn_large_files(engine.large_file_finder(Some(vec![dir.path().to_path_buf()])))
        .unwrap();
    assert!(!engine.is_current(junk.generation()));

    dup.wait().unwrap();
    large.wait().unwrap();
    let generation = junk.generation();
    let categories = junk.wait().unwrap();
    assert!(analyzer.finish_scan(generation, categories));
}

#[test]
fn test_inline_junk_scan_uses_engine_generation() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut analyzer = JunkAnalyzer::new(catalog(dir.path()));

    engine.find_large_files(
        &engine.large_file_finder(Some(vec![dir.path().to_path_buf()])),
        &NoopObserver,
    );
    engine.analyze_junk(&mut analyzer, &NoopObserver);
    assert!(engine.is_current(analyzer.generation()));
    assert_eq!(analyzer.state(), ScanState::Summary);
}

// ─── Background scans ─────────────────────────────────────────────────────────

#[test]
fn test_background_duplicate_scan_streams_events() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b"] {
        write(&dir.path().join(name), 5000);
    }
    let engine = engine();
    let config = engine.duplicate_config(Some(vec![dir.path().to_path_buf()]));

    let handle = engine.spawn_duplicates(config).unwrap();
    let generation = handle.generation();
    assert!(engine.is_current(generation));
    let events = handle.events().clone();
    let groups = handle.wait().unwrap();

    assert_eq!(groups.len(), 1);
    let last = events
        .try_iter()
        .filter_map(|e| match e {
            ScanEvent::Duplicates { groups, .. } => Some(groups),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(last, groups);
}

#[test]
fn test_newer_scan_supersedes_older() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    let mut finder = engine.large_file_finder(Some(vec![dir.path().to_path_buf()]));
    finder.set_threshold(1);

    let old = engine.spawn_large_files(finder.clone()).unwrap();
    let new = engine.spawn_large_files(finder).unwrap();
    assert!(!engine.is_current(old.generation()));
    assert!(engine.is_current(new.generation()));
    old.wait().unwrap();
    new.wait().unwrap();
}

// ─── Sizes ────────────────────────────────────────────────────────────────────

#[test]
fn test_delete_invalidates_cached_size() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("bucket/f"), 700);
    let engine = engine();
    let target = dir.path().join("bucket");

    assert_eq!(engine.cached_size(&target), 700);
    assert_eq!(engine.delete(&target), 700);
    assert_eq!(engine.cached_size(&target), 0);
}
