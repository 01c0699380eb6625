use std::fs;
use std::path::PathBuf;

use client_state::{
    state_file, state_root, ClientStateError, FileStateStore, MemoryStateStore, StateStore,
    ACTIVE_SESSION_KEY, USER_ID_KEY,
};
use tempfile::TempDir;

fn temp_state_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("client_state.json");
    (dir, path)
}

#[test]
fn open_starts_empty_when_file_is_missing() {
    let (_dir, path) = temp_state_path();

    let store = FileStateStore::open(&path).expect("missing file opens as empty store");
    assert!(store.get(ACTIVE_SESSION_KEY).is_none());
    assert!(store.get(USER_ID_KEY).is_none());
}

#[test]
fn set_persists_across_reopen() {
    let (_dir, path) = temp_state_path();

    let mut store = FileStateStore::open(&path).expect("store should open");
    store
        .set(ACTIVE_SESSION_KEY, "session-1")
        .expect("set should persist");
    store
        .set(USER_ID_KEY, "user-1")
        .expect("set should persist");

    let reopened = FileStateStore::open(&path).expect("store should reopen");
    assert_eq!(
        reopened.get(ACTIVE_SESSION_KEY).as_deref(),
        Some("session-1")
    );
    assert_eq!(reopened.get(USER_ID_KEY).as_deref(), Some("user-1"));
}

#[test]
fn set_overwrites_previous_value() {
    let (_dir, path) = temp_state_path();

    let mut store = FileStateStore::open(&path).expect("store should open");
    store
        .set(ACTIVE_SESSION_KEY, "session-1")
        .expect("first set should persist");
    store
        .set(ACTIVE_SESSION_KEY, "session-2")
        .expect("second set should persist");

    let reopened = FileStateStore::open(&path).expect("store should reopen");
    assert_eq!(
        reopened.get(ACTIVE_SESSION_KEY).as_deref(),
        Some("session-2")
    );
}

#[test]
fn set_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = state_file(dir.path());
    assert!(!state_root(dir.path()).exists());

    let mut store = FileStateStore::open(&path).expect("store should open");
    store
        .set(USER_ID_KEY, "user-1")
        .expect("set should create directories and persist");

    assert!(path.exists());
}

#[test]
fn open_rejects_malformed_state_file() {
    let (_dir, path) = temp_state_path();
    fs::write(&path, "not json").expect("fixture file should be written");

    let error = FileStateStore::open(&path)
        .err()
        .expect("malformed file must fail to open");
    assert!(matches!(error, ClientStateError::Parse { .. }));
}

#[test]
fn open_rejects_unsupported_version() {
    let (_dir, path) = temp_state_path();
    fs::write(&path, r#"{"version": 2, "values": {}}"#).expect("fixture file should be written");

    let error = FileStateStore::open(&path)
        .err()
        .expect("future version must fail to open");
    assert!(matches!(
        error,
        ClientStateError::UnsupportedVersion { found: 2, .. }
    ));
}

#[test]
fn memory_store_round_trips_without_touching_disk() {
    let mut store = MemoryStateStore::new();

    assert!(store.get(ACTIVE_SESSION_KEY).is_none());
    store
        .set(ACTIVE_SESSION_KEY, "session-1")
        .expect("memory set is infallible");
    assert_eq!(store.get(ACTIVE_SESSION_KEY).as_deref(), Some("session-1"));
}
