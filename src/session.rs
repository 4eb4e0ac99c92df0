//! Session runtime: one tracker, one store, one live aggregate.
//!
//! [`ProgressSession`] binds a [`ProgressTracker`] to a [`ProgressStore`]
//! for the single active session. Each mutation runs the tracker's pure
//! transition, flushes the new aggregate to the store, and only then
//! replaces the held reference — so the persisted copy is never behind the
//! in-memory one, and a failed write leaves the in-memory aggregate
//! untouched for the caller to retry the user action.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use storypath::session::ProgressSession;
//! use storypath::store::InMemoryProgressStore;
//! use storypath::tracker::ProgressTracker;
//! use storypath::types::StepStatus;
//! use storypath::workflow::Workflow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .step("s1", "Meet your hero", "agent_hero")
//!     .step("s2", "Pick a setting", "agent_setting")
//!     .build();
//! let tracker = ProgressTracker::new(workflow);
//! let store = InMemoryProgressStore::new();
//!
//! let (mut session, _init) = ProgressSession::open(tracker, store, "session-1").await?;
//! session.activate_step("s1").await?;
//! session.update_status("s1", StepStatus::Complete, None).await?;
//! assert_eq!(session.progress().overall.completed_steps, 1);
//! # Ok(())
//! # }
//! ```

use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use crate::message::Message;
use crate::progress::{CapturedDatum, UserProgress};
use crate::store::{ProgressStore, StoreError};
use crate::tracker::{ProgressTracker, TrackerError};
use crate::types::StepStatus;
use crate::workflow::Step;

/// Errors raised while driving a session.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("persisted session '{session_id}' belongs to workflow '{found}', expected '{expected}'")]
    #[diagnostic(
        code(storypath::session::workflow_mismatch),
        help("Reset the session or load the matching workflow definition.")
    )]
    WorkflowMismatch {
        session_id: String,
        expected: String,
        found: String,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Indicates how a session was initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInit {
    /// A brand new aggregate was created and persisted.
    Fresh,
    /// An existing aggregate was loaded from the store.
    Resumed {
        /// How many steps were already complete at load time.
        completed_steps: usize,
    },
}

/// The single active session: tracker + store + latest aggregate.
#[derive(Debug)]
pub struct ProgressSession<S> {
    tracker: ProgressTracker,
    store: S,
    progress: UserProgress,
}

impl<S: ProgressStore> ProgressSession<S> {
    /// Loads the persisted aggregate for `session_id`, or creates and
    /// persists a fresh one when none exists.
    ///
    /// A loaded aggregate is validated against the tracker's workflow:
    /// its workflow id must match, and its current step and every step key
    /// must name a known step.
    pub async fn open(
        tracker: ProgressTracker,
        store: S,
        session_id: &str,
    ) -> Result<(Self, SessionInit)> {
        match store.load(session_id).await? {
            Some(progress) => {
                if progress.workflow_id != tracker.workflow().id {
                    return Err(SessionError::WorkflowMismatch {
                        session_id: session_id.to_string(),
                        expected: tracker.workflow().id.clone(),
                        found: progress.workflow_id,
                    });
                }
                tracker.validate(&progress)?;
                let completed_steps = progress.overall.completed_steps;
                info!(session_id, completed_steps, "resumed session");
                Ok((
                    Self {
                        tracker,
                        store,
                        progress,
                    },
                    SessionInit::Resumed { completed_steps },
                ))
            }
            None => {
                let progress = tracker.create_new_progress(session_id);
                store.save(&progress).await?;
                info!(session_id, "created session");
                Ok((
                    Self {
                        tracker,
                        store,
                        progress,
                    },
                    SessionInit::Fresh,
                ))
            }
        }
    }

    /// The latest aggregate.
    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    /// This session's id.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.progress.session_id
    }

    /// The step after the current one in traversal order, if any.
    #[must_use]
    pub fn next_step(&self) -> Option<&Step> {
        self.tracker.get_next_step(&self.progress)
    }

    /// Whether `step_id` may be activated right now.
    pub fn can_activate(&self, step_id: &str) -> Result<bool> {
        Ok(self.tracker.can_activate_step(&self.progress, step_id)?)
    }

    /// Enters a step: a first visit moves it to `in_progress`; a revisit
    /// begins a fresh attempt through reactivation.
    pub async fn activate_step(&mut self, step_id: &str) -> Result<()> {
        let visited = self
            .progress
            .step(step_id)
            .map(|record| record.is_visited())
            .unwrap_or(false);
        let updated = if visited {
            self.tracker.reactivate_step(self.progress.clone(), step_id)?
        } else {
            self.tracker.update_step_status(
                self.progress.clone(),
                step_id,
                StepStatus::InProgress,
                None,
            )?
        };
        self.commit(updated).await
    }

    /// Applies a status change (optionally with captured data) and flushes.
    pub async fn update_status(
        &mut self,
        step_id: &str,
        status: StepStatus,
        captured_data: Option<Vec<CapturedDatum>>,
    ) -> Result<()> {
        let updated =
            self.tracker
                .update_step_status(self.progress.clone(), step_id, status, captured_data)?;
        self.commit(updated).await
    }

    /// Records the conversation reference for a step and flushes.
    pub async fn record_conversation(
        &mut self,
        step_id: &str,
        conversation_id: &str,
    ) -> Result<()> {
        let updated =
            self.tracker
                .record_conversation(self.progress.clone(), step_id, conversation_id)?;
        self.commit(updated).await
    }

    /// Appends transcript messages to a step and flushes.
    pub async fn append_messages(&mut self, step_id: &str, messages: Vec<Message>) -> Result<()> {
        let updated = self
            .tracker
            .append_messages(self.progress.clone(), step_id, messages)?;
        self.commit(updated).await
    }

    /// Discards the session: deletes the persisted copy and replaces the
    /// in-memory aggregate with a fresh one. The fresh aggregate is not
    /// persisted until the next mutation.
    pub async fn reset(&mut self) -> Result<()> {
        self.store.delete(&self.progress.session_id).await?;
        self.progress = self.tracker.create_new_progress(&self.progress.session_id);
        info!(session_id = %self.progress.session_id, "session reset");
        Ok(())
    }

    /// Flush-then-swap: the store write must succeed before the new
    /// aggregate becomes this session's state.
    async fn commit(&mut self, updated: UserProgress) -> Result<()> {
        self.store.save(&updated).await?;
        self.progress = updated;
        Ok(())
    }
}
