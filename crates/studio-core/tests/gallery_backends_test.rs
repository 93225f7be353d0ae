//! Integration test: gallery persistence on disk.
//!
//! Verifies that:
//! 1. JSON file and sled backends reload the same newest-first list.
//! 2. clear() removes the persisted key so a reopened store starts empty.
//! 3. Ids issued after a reload continue past the highest stored id.

use chrono::Utc;
use studio_core::{AspectRatio, GalleryBackend, GalleryStore, JsonFileBackend, SledBackend};

fn fill(store: &mut GalleryStore) -> Vec<String> {
    let mut ids = Vec::new();
    for (concept, ratio) in [("first", AspectRatio::Square), ("second", AspectRatio::Landscape)] {
        let item = store.new_item("https://placehold.co/1080x1080", "poster", ratio, concept, Utc::now());
        ids.push(item.id.clone());
        store.append(item).unwrap();
    }
    ids
}

#[test]
fn json_file_backend_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::in_dir(dir.path().join("nested"));

    let mut store = GalleryStore::open(backend.clone()).unwrap();
    let ids = fill(&mut store);
    let saved = store.items().to_vec();
    assert_eq!(saved[0].concept, "second");

    let reopened = GalleryStore::open(backend.clone()).unwrap();
    assert_eq!(reopened.items(), saved.as_slice());
    assert!(backend.path().ends_with("studio_gallery.json"));

    let mut reopened = reopened;
    let next: i64 = reopened.next_id().parse().unwrap();
    assert!(ids.iter().all(|id| next > id.parse::<i64>().unwrap()));
}

#[test]
fn json_file_clear_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::in_dir(dir.path());
    let mut store = GalleryStore::open(backend.clone()).unwrap();
    fill(&mut store);
    assert!(backend.path().exists());

    store.clear().unwrap();
    assert!(!backend.path().exists());
    assert!(GalleryStore::open(backend).unwrap().is_empty());
}

#[test]
fn corrupted_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::in_dir(dir.path());
    std::fs::write(backend.path(), "{not json").unwrap();
    assert!(backend.load().is_err());
    assert!(GalleryStore::open(backend).is_err());
}

#[test]
fn sled_backend_reloads_persisted_list() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SledBackend::open(dir.path().join("gallery_db")).unwrap();

    let mut store = GalleryStore::open(backend.clone()).unwrap();
    let ids = fill(&mut store);
    assert!(store.remove_by_id(&ids[0]).unwrap());
    let saved = store.items().to_vec();
    drop(store);

    let store = GalleryStore::open(backend).unwrap();
    assert_eq!(store.items(), saved.as_slice());
    assert_eq!(store.len(), 1);
    assert_eq!(store.items()[0].concept, "second");
}

#[test]
fn sled_clear_drops_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SledBackend::open(dir.path().join("gallery_db")).unwrap();
    let mut store = GalleryStore::open(backend.clone()).unwrap();
    fill(&mut store);
    store.clear().unwrap();
    assert!(backend.load().unwrap().is_empty());
}
