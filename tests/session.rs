use std::sync::Arc;

use storypath::message::Message;
use storypath::progress::CapturedDatum;
use storypath::session::{ProgressSession, SessionError, SessionInit};
use storypath::store::{InMemoryProgressStore, ProgressStore};
use storypath::tracker::{ProgressTracker, TrackerError};
use storypath::types::StepStatus;
use storypath::workflow::Workflow;

mod common;
use common::*;

fn shared_store() -> Arc<InMemoryProgressStore> {
    Arc::new(InMemoryProgressStore::new())
}

#[tokio::test]
async fn open_creates_then_resumes() {
    let store = shared_store();

    let (mut session, init) =
        ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
            .await
            .expect("open fresh");
    assert_eq!(init, SessionInit::Fresh);
    // the fresh aggregate is persisted immediately
    assert!(store.load("session-1").await.expect("load").is_some());

    session.activate_step("s1").await.expect("activate");
    session
        .update_status("s1", StepStatus::Complete, None)
        .await
        .expect("complete");
    drop(session);

    let (session, init) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open resumed");
    assert_eq!(init, SessionInit::Resumed { completed_steps: 1 });
    assert_status(session.progress(), "s1", StepStatus::Complete);
    assert_eq!(session.next_step().map(|s| s.id.as_str()), Some("s2"));
}

#[tokio::test]
async fn every_mutation_is_flushed_before_returning() {
    let store = shared_store();
    let (mut session, _) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");

    session.activate_step("s1").await.expect("activate");
    let persisted = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    assert_status(&persisted, "s1", StepStatus::InProgress);

    session
        .update_status(
            "s1",
            StepStatus::Started,
            Some(vec![CapturedDatum::text("hero_name", "Луна")]),
        )
        .await
        .expect("start");
    let persisted = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    assert_status(&persisted, "s1", StepStatus::Started);
    assert_eq!(persisted.step("s1").expect("record").captured_data.len(), 1);
}

#[tokio::test]
async fn rapid_transcript_appends_are_not_lost() {
    let store = shared_store();
    let (mut session, _) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");
    session.activate_step("s1").await.expect("activate");
    session
        .record_conversation("s1", "conv_8842")
        .await
        .expect("conversation id");

    session
        .append_messages("s1", vec![Message::agent("Who is your hero?")])
        .await
        .expect("first append");
    session
        .append_messages("s1", vec![Message::user("Луна the space cat!")])
        .await
        .expect("second append");

    // a second reader sees both utterances and the conversation reference
    let persisted = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    let record = persisted.step("s1").expect("record");
    assert_eq!(record.conversation_id, "conv_8842");
    assert_eq!(record.messages.len(), 2);
}

#[tokio::test]
async fn activation_gate_applies_through_the_session() {
    let store = shared_store();
    let (mut session, _) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");

    assert!(!session.can_activate("s3").expect("known step"));
    let err = session
        .activate_step("s3")
        .await
        .expect_err("skip-ahead must fail");
    assert!(matches!(
        err,
        SessionError::Tracker(TrackerError::InvalidTransition { .. })
    ));
    // the failed mutation left nothing behind
    let persisted = store
        .load("session-1")
        .await
        .expect("load")
        .expect("present");
    assert_status(&persisted, "s3", StepStatus::NotStarted);
}

#[tokio::test]
async fn revisiting_a_completed_step_begins_a_new_attempt() {
    let store = shared_store();
    let (mut session, _) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");
    session.activate_step("s1").await.expect("activate");
    session
        .update_status("s1", StepStatus::Complete, None)
        .await
        .expect("complete");

    session.activate_step("s1").await.expect("revisit");
    let record = session.progress().step("s1").expect("record");
    assert_eq!(record.status, StepStatus::InProgress);
    assert_eq!(record.attempt_count, 2);
}

#[tokio::test]
async fn reset_deletes_the_persisted_copy() {
    let store = shared_store();
    let (mut session, _) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");
    session.activate_step("s1").await.expect("activate");
    session
        .update_status("s1", StepStatus::Complete, None)
        .await
        .expect("complete");

    session.reset().await.expect("reset");
    assert!(store.load("session-1").await.expect("load").is_none());
    let progress = session.progress();
    assert_eq!(progress.overall.completed_steps, 0);
    assert_eq!(progress.current_step_id, "s1");
    assert_status(progress, "s1", StepStatus::NotStarted);
}

#[tokio::test]
async fn mismatched_workflow_is_rejected_on_open() {
    let store = shared_store();
    let (_, init) = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect("open");
    assert_eq!(init, SessionInit::Fresh);

    let other = ProgressTracker::new(
        Workflow::builder("bedtime_poems", "Bedtime Poems")
            .step("p1", "Pick a rhyme", "agent_rhyme")
            .build(),
    );
    let err = ProgressSession::open(other, Arc::clone(&store), "session-1")
        .await
        .expect_err("workflow mismatch must fail");
    assert!(matches!(err, SessionError::WorkflowMismatch { .. }));
}

#[tokio::test]
async fn corrupted_current_step_is_rejected_on_open() {
    let store = shared_store();
    let tracker = story_tracker();
    let mut progress = tracker.create_new_progress("session-1");
    progress.current_step_id = "vanished".to_string();
    store.save(&progress).await.expect("save corrupted");

    let err = ProgressSession::open(story_tracker(), Arc::clone(&store), "session-1")
        .await
        .expect_err("unknown current step must fail validation");
    assert!(matches!(
        err,
        SessionError::Tracker(TrackerError::UnknownStep { .. })
    ));
}
