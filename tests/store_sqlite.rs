#![cfg(feature = "sqlite")]

use storypath::store::{ProgressStore, SqliteProgressStore};
use storypath::types::StepStatus;

mod common;
use common::*;

async fn temp_store(dir: &tempfile::TempDir) -> SqliteProgressStore {
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("progress.db").display()
    );
    SqliteProgressStore::connect(&url)
        .await
        .expect("connect and migrate")
}

#[tokio::test]
async fn sqlite_round_trip_and_delete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;
    let tracker = story_tracker();

    assert!(store.load("session-1").await.expect("load").is_none());

    let progress = tracker.create_new_progress("session-1");
    let progress = tracker
        .update_step_status(progress, "s1", StepStatus::InProgress, None)
        .expect("activate s1");
    store.save(&progress).await.expect("save");

    let loaded = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded, progress);

    store.delete("session-1").await.expect("delete");
    assert!(store.load("session-1").await.expect("load").is_none());
}

#[tokio::test]
async fn sqlite_save_is_an_upsert() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;
    let tracker = story_tracker();

    let progress = tracker.create_new_progress("session-1");
    store.save(&progress).await.expect("first save");
    let progress = tracker
        .update_step_status(progress, "s1", StepStatus::InProgress, None)
        .expect("activate s1");
    let progress = tracker
        .update_step_status(progress, "s1", StepStatus::Complete, None)
        .expect("complete s1");
    store.save(&progress).await.expect("second save");

    let loaded = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded.overall.completed_steps, 1);
    assert_status(&loaded, "s1", StepStatus::Complete);

    let ids = store.list_sessions().await.expect("list");
    assert_eq!(ids, ["session-1"]);
}

#[tokio::test]
async fn sqlite_lists_multiple_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir).await;
    let tracker = story_tracker();

    store
        .save(&tracker.create_new_progress("session-a"))
        .await
        .expect("save a");
    store
        .save(&tracker.create_new_progress("session-b"))
        .await
        .expect("save b");

    let mut ids = store.list_sessions().await.expect("list");
    ids.sort();
    assert_eq!(ids, ["session-a", "session-b"]);
}
