//! End-to-end batch runs against the directory-backed store.

use bucket_resizer::batch::{BatchError, BatchOptions, BatchOrchestrator, ItemStatus, SkipReason};
use bucket_resizer::config::{BatchConfig, resolve_config};
use bucket_resizer::imaging::{Dimensions, PixelPlane, bitmap};
use bucket_resizer::notify::MemoryNotifier;
use bucket_resizer::state::SuffixTracker;
use bucket_resizer::store::{FsObjectStore, ObjectStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_bitmap(root: &Path, rel: &str, width: u32, height: u32) {
    let plane = PixelPlane::filled(Dimensions::new(width, height), [0, 0, 0]).unwrap();
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bitmap::encode(&plane).unwrap()).unwrap();
}

fn bound() -> Dimensions {
    BatchConfig::default().target.dimensions()
}

#[test]
fn processes_directory_and_marks_files() {
    let tmp = TempDir::new().unwrap();
    write_bitmap(tmp.path(), "images/image/a.bmp", 200, 100);
    write_bitmap(tmp.path(), "images/image/b.bmp", 40, 160);
    write_bitmap(tmp.path(), "images/other/c.bmp", 10, 10);

    let notifier = MemoryNotifier::new();
    let orchestrator = BatchOrchestrator::new(
        FsObjectStore::new(tmp.path()),
        &notifier,
        SuffixTracker::default(),
        BatchOptions::default(),
    );

    let result = orchestrator.run("images", "image/", bound()).unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.summary.succeeded, 2);
    assert_eq!(result.summary.failed, 0);

    let dir = tmp.path().join("images/image");
    assert!(!dir.join("a.bmp").exists());
    assert!(!dir.join("b.bmp").exists());
    assert!(dir.join("a.bmp_processed.jpg").exists());
    assert!(dir.join("b.bmp_processed.jpg").exists());
    // Outside the prefix: untouched
    assert!(tmp.path().join("images/other/c.bmp").exists());

    assert_eq!(
        notifier.sorted_messages(),
        vec![
            "Image processed and uploaded to images: image/a.bmp_processed.jpg",
            "Image processed and uploaded to images: image/b.bmp_processed.jpg",
        ]
    );

    let sizes: Vec<(u32, u32)> = result
        .summary
        .items
        .iter()
        .filter_map(|item| match item.status {
            ItemStatus::Succeeded { width, height, .. } => Some((width, height)),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![(100, 50), (25, 100)]);
}

#[test]
fn rerun_skips_everything() {
    let tmp = TempDir::new().unwrap();
    write_bitmap(tmp.path(), "images/image/a.bmp", 20, 20);

    let store = FsObjectStore::new(tmp.path());
    let notifier = MemoryNotifier::new();
    let orchestrator =
        BatchOrchestrator::new(&store, &notifier, SuffixTracker::default(), BatchOptions::default());

    orchestrator.run("images", "image/", bound()).unwrap();
    let second = orchestrator.run("images", "image/", bound()).unwrap();

    assert_eq!(second.summary.attempted, 0);
    assert_eq!(second.summary.items.len(), 1);
    assert_eq!(
        second.summary.items[0].status,
        ItemStatus::Skipped {
            reason: SkipReason::AlreadyProcessed
        }
    );
    assert_eq!(notifier.published().len(), 1);
    assert_eq!(
        store.list("images", "image/").unwrap(),
        vec!["image/a.bmp_processed.jpg"]
    );
}

#[test]
fn corrupt_file_is_left_for_retry() {
    let tmp = TempDir::new().unwrap();
    write_bitmap(tmp.path(), "images/image/good.bmp", 8, 8);
    fs::write(tmp.path().join("images/image/bad.bmp"), b"BM truncated").unwrap();

    let orchestrator = BatchOrchestrator::new(
        FsObjectStore::new(tmp.path()),
        MemoryNotifier::new(),
        SuffixTracker::default(),
        BatchOptions::default(),
    );
    let result = orchestrator.run("images", "image/", bound()).unwrap();

    assert_eq!(result.summary.succeeded, 1);
    assert_eq!(result.summary.failed, 1);
    assert!(tmp.path().join("images/image/bad.bmp").exists());
    assert!(!tmp.path().join("images/image/bad.bmp_processed.jpg").exists());
}

#[test]
fn missing_container_is_batch_error() {
    let tmp = TempDir::new().unwrap();
    let orchestrator = BatchOrchestrator::new(
        FsObjectStore::new(tmp.path()),
        MemoryNotifier::new(),
        SuffixTracker::default(),
        BatchOptions::default(),
    );

    let err = orchestrator.run("absent", "image/", bound()).unwrap_err();
    assert!(matches!(err, BatchError::List { .. }));
}

#[test]
fn configured_suffix_and_target_drive_the_run() {
    let overlay: toml::Value = toml::from_str(
        r#"
        processed_suffix = ".small.bmp"
        [target]
        width = 10
        height = 10
        "#,
    )
    .unwrap();
    let config = resolve_config(Some(overlay)).unwrap();

    let tmp = TempDir::new().unwrap();
    write_bitmap(tmp.path(), "images/image/a.bmp", 40, 20);

    let store = FsObjectStore::new(tmp.path());
    let orchestrator = BatchOrchestrator::new(
        &store,
        MemoryNotifier::new(),
        SuffixTracker::new(config.processed_suffix.clone()),
        BatchOptions::from_config(&config),
    );
    let result = orchestrator
        .run(&config.container, &config.prefix, config.target.dimensions())
        .unwrap();

    assert_eq!(
        result.summary.items[0].status,
        ItemStatus::Succeeded {
            processed_key: "image/a.bmp.small.bmp".to_string(),
            width: 10,
            height: 5,
            notified: true,
        }
    );
    assert!(store.exists("images", "image/a.bmp.small.bmp").unwrap());
}
