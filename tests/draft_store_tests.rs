// SPDX-License-Identifier: MIT

//! Draft store persistence tests.

mod common;

use common::station_at;
use refill_finder::services::{DraftStore, Settings, SettingsStore};
use std::path::PathBuf;

/// Fresh file path under the system temp dir for each test.
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "refill-finder-{}-{}.json",
        name,
        uuid::Uuid::new_v4().simple()
    ))
}

#[test]
fn test_saved_draft_appears_in_load_all() {
    let store = DraftStore::open(temp_path("save")).unwrap();
    let draft = station_at("d1", 51.5, -0.12);

    store.save(&draft).unwrap();

    let drafts = store.load_all();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, "d1");
    assert!(drafts[0].is_draft, "stored copy must be flagged as a draft");
}

#[test]
fn test_save_upserts_by_id() {
    let store = DraftStore::open(temp_path("upsert")).unwrap();
    let mut draft = station_at("d1", 51.5, -0.12);
    store.save(&draft).unwrap();

    draft.name = "Renamed".to_string();
    store.save(&draft).unwrap();

    let drafts = store.load_all();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].name, "Renamed");
}

#[test]
fn test_delete_removes_draft() {
    let store = DraftStore::open(temp_path("delete")).unwrap();
    store.save(&station_at("d1", 51.5, -0.12)).unwrap();

    store.delete("d1").unwrap();
    assert!(store.load_all().is_empty());
}

#[test]
fn test_delete_unknown_id_is_a_noop() {
    let store = DraftStore::open(temp_path("noop")).unwrap();
    store.delete("never-existed").unwrap();
}

#[test]
fn test_drafts_survive_reopen() {
    let path = temp_path("reopen");
    {
        let store = DraftStore::open(path.clone()).unwrap();
        store.save(&station_at("d1", 51.5, -0.12)).unwrap();
        store.save(&station_at("d2", 48.8, 2.35)).unwrap();
    }

    let reopened = DraftStore::open(path).unwrap();
    let mut ids: Vec<_> = reopened.load_all().into_iter().map(|d| d.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["d1", "d2"]);
}

#[test]
fn test_draft_without_coordinate_is_allowed() {
    let store = DraftStore::open(temp_path("nocoord")).unwrap();
    let mut draft = station_at("d1", 0.0, 0.0);
    draft.coordinate = None;

    store.save(&draft).unwrap();
    assert_eq!(store.load_all()[0].coordinate, None);
}

#[test]
fn test_settings_defaults_and_persistence() {
    let path = temp_path("settings");
    let store = SettingsStore::open(path.clone()).unwrap();
    assert_eq!(store.get(), Settings::default());

    let custom = Settings {
        search_radius_miles: 2.5,
        dark_mode: true,
        notifications_enabled: false,
    };
    store.set(custom.clone()).unwrap();

    let reopened = SettingsStore::open(path).unwrap();
    assert_eq!(reopened.get(), custom);
}
