// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Result cache persistence across process lifetimes

use dara_node::cache::{BoundedCache, ResultCache};
use dara_node::modes::Mode;
use dara_node::orchestrator::{DetectionRequest, Detector, ImageInput};
use std::time::Duration;

use crate::common::{solid_image, FakeBackend};

fn image() -> ImageInput {
    ImageInput::Decoded(solid_image([90, 90, 30]))
}

#[tokio::test]
async fn test_results_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let first_backend = FakeBackend::replying("A bench under a tree");
    let first = {
        let detector = Detector::new(first_backend.clone())
            .with_result_cache(Some(ResultCache::with_persistence(10, None, path.clone())));
        detector
            .detect(DetectionRequest::new(image(), Mode::Scene))
            .await
            .unwrap()
    };
    assert!(path.exists());

    let second_backend = FakeBackend::replying("something else entirely");
    let detector = Detector::new(second_backend.clone())
        .with_result_cache(Some(ResultCache::with_persistence(10, None, path.clone())));
    let replay = detector
        .detect(DetectionRequest::new(image(), Mode::Scene))
        .await
        .unwrap();

    assert_eq!(first_backend.calls(), 1);
    assert_eq!(second_backend.calls(), 0);
    assert_eq!(replay, first);
}

#[tokio::test]
async fn test_explicit_persist_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("results.json");
    let detector = Detector::new(FakeBackend::replying("EXIT"))
        .with_result_cache(Some(ResultCache::with_persistence(10, None, path.clone())));

    detector
        .detect(DetectionRequest::new(image(), Mode::Text))
        .await
        .unwrap();
    assert_eq!(detector.persist().unwrap(), 1);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entries = json.as_object().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = entries.values().next().unwrap();
    assert_eq!(entry["value"]["text"], "EXIT");
    assert!(entry["timestamp"].is_string());
}

#[test]
fn test_corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    std::fs::write(&path, b"{ definitely not json").unwrap();

    let cache = ResultCache::with_persistence(10, None, path);
    assert!(cache.is_empty());
}

#[test]
fn test_expired_entries_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let cache = BoundedCache::new("test", 4, None);
    cache.set("old", 1u32);
    cache.save_to(&path).unwrap();

    std::thread::sleep(Duration::from_millis(300));
    cache.set("new", 2u32);
    cache.save_to(&path).unwrap();

    let restored = BoundedCache::<u32>::new("test", 4, Some(Duration::from_millis(150)));
    assert_eq!(restored.load_from(&path).unwrap(), 1);
    assert_eq!(restored.get("new"), Some(2));
    assert!(!restored.contains("old"));
}

#[test]
fn test_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = BoundedCache::<u32>::new("test", 4, None);
    assert_eq!(cache.load_from(&dir.path().join("absent.json")).unwrap(), 0);
}
