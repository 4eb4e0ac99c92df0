//! The workflow progress tracker: pure transition functions over
//! [`UserProgress`] aggregates.
//!
//! The tracker holds the loaded [`Workflow`] definition and enforces the
//! step state machine, activation ordering, and derived-summary
//! recomputation. Every mutating operation takes the aggregate by value and
//! returns a new one; the caller owns replacing its held reference. Nothing
//! here performs I/O — persistence is the [`crate::store`] collaborator's
//! job, wired together by [`crate::session`].
//!
//! # Activation ordering
//!
//! A step may be activated when it is the designated current step, when it
//! has been visited before (reactivation of any visited step is always
//! allowed), or when it is the first not-yet-completed step in traversal
//! order. A never-visited step further ahead is rejected: the workflow is a
//! guided sequence and skipping ahead is a caller bug, not a user choice.
//!
//! # Examples
//!
//! ```rust
//! use storypath::tracker::ProgressTracker;
//! use storypath::types::StepStatus;
//! use storypath::workflow::Workflow;
//!
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .section("setup", "Story Setup")
//!     .step("s1", "Meet your hero", "agent_hero")
//!     .step("s2", "Pick a setting", "agent_setting")
//!     .build();
//! let tracker = ProgressTracker::new(workflow);
//!
//! let progress = tracker.create_new_progress("session-1");
//! assert_eq!(progress.current_step_id, "s1");
//!
//! let progress = tracker
//!     .update_step_status(progress, "s1", StepStatus::InProgress, None)
//!     .unwrap();
//! let progress = tracker
//!     .update_step_status(progress, "s1", StepStatus::Complete, None)
//!     .unwrap();
//!
//! assert_eq!(progress.overall.completed_steps, 1);
//! assert_eq!(tracker.get_next_step(&progress).map(|s| s.id.as_str()), Some("s2"));
//! ```

use chrono::Utc;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::message::Message;
use crate::progress::{CapturedDatum, OverallProgress, StepProgress, UserProgress};
use crate::types::StepStatus;
use crate::workflow::{Step, Workflow};

/// Logic errors raised by tracker operations.
///
/// Both variants are caller bugs, not retryable faults: the request itself
/// was invalid and re-issuing it unchanged will fail again.
#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("unknown step '{step_id}' for workflow '{workflow_id}'")]
    #[diagnostic(
        code(storypath::tracker::unknown_step),
        help("Step ids must come from the loaded workflow definition.")
    )]
    UnknownStep {
        workflow_id: String,
        step_id: String,
    },

    #[error("invalid transition for step '{step_id}': {from} -> {to} ({reason})")]
    #[diagnostic(
        code(storypath::tracker::invalid_transition),
        help(
            "Statuses follow not_started -> in_progress -> started -> complete, \
             with error retryable into in_progress; completed steps are re-entered \
             through reactivate_step."
        )
    )]
    InvalidTransition {
        step_id: String,
        from: StepStatus,
        to: StepStatus,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Maintains one session's [`UserProgress`] against a loaded [`Workflow`].
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    workflow: Workflow,
}

impl ProgressTracker {
    /// Creates a tracker over a loaded workflow definition.
    #[must_use]
    pub fn new(workflow: Workflow) -> Self {
        Self { workflow }
    }

    /// The workflow definition this tracker enforces.
    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Builds a fresh aggregate: every step `not_started`, the current step
    /// pointing at the first step in traversal order, summary zeroed.
    #[must_use]
    pub fn create_new_progress(&self, session_id: &str) -> UserProgress {
        let now = Utc::now();
        let steps = self
            .workflow
            .steps()
            .map(|step| (step.id.clone(), StepProgress::fresh(&step.id, now)))
            .collect();
        UserProgress {
            session_id: session_id.to_string(),
            workflow_id: self.workflow.id.clone(),
            current_step_id: self
                .workflow
                .first_step()
                .map(|s| s.id.clone())
                .unwrap_or_default(),
            steps,
            overall: OverallProgress::zeroed(self.workflow.len()),
        }
    }

    /// Checks that an aggregate is consistent with this tracker's workflow:
    /// the current step and every map key must name a known step.
    pub fn validate(&self, progress: &UserProgress) -> Result<()> {
        if !self.workflow.contains(&progress.current_step_id) {
            return Err(self.unknown(&progress.current_step_id));
        }
        for step_id in progress.steps.keys() {
            if !self.workflow.contains(step_id) {
                return Err(self.unknown(step_id));
            }
        }
        Ok(())
    }

    /// Whether `step_id` may be activated right now.
    ///
    /// True for the designated current step, for any previously visited
    /// step, and for the first not-yet-completed step in traversal order.
    /// A never-visited step beyond that frontier is not eligible.
    pub fn can_activate_step(&self, progress: &UserProgress, step_id: &str) -> Result<bool> {
        let record = self.step_record(progress, step_id)?;
        if progress.current_step_id == step_id || record.is_visited() {
            return Ok(true);
        }
        let frontier = self.workflow.steps().find(|step| {
            progress
                .step(&step.id)
                .map(|r| r.status != StepStatus::Complete)
                .unwrap_or(true)
        });
        Ok(frontier.map(|step| step.id == step_id).unwrap_or(false))
    }

    /// Applies a status change to one step and returns the new aggregate.
    ///
    /// The requested transition is validated against the step state machine;
    /// entering `in_progress` from `not_started` additionally requires the
    /// step to be activation-eligible. `captured_data`, when present, is
    /// appended after any existing captures — never replacing them. The
    /// derived summary is recomputed before the aggregate is returned.
    ///
    /// Re-sending a step's current status is an idempotent refresh: it
    /// updates `last_modified` (and may append captured data) but never
    /// touches `attempt_count`. A fresh attempt — first activation, or retry
    /// out of `error` — increments `attempt_count`.
    pub fn update_step_status(
        &self,
        mut progress: UserProgress,
        step_id: &str,
        new_status: StepStatus,
        captured_data: Option<Vec<CapturedDatum>>,
    ) -> Result<UserProgress> {
        let from = self.step_record(&progress, step_id)?.status;
        if !from.can_transition_to(new_status) {
            return Err(TrackerError::InvalidTransition {
                step_id: step_id.to_string(),
                from,
                to: new_status,
                reason: "the step state machine has no such edge",
            });
        }
        if from == StepStatus::NotStarted
            && new_status == StepStatus::InProgress
            && !self.can_activate_step(&progress, step_id)?
        {
            return Err(TrackerError::InvalidTransition {
                step_id: step_id.to_string(),
                from,
                to: new_status,
                reason: "step is ahead of the first not-yet-completed step",
            });
        }

        let now = Utc::now();
        let Some(record) = progress.steps.get_mut(step_id) else {
            return Err(self.unknown(step_id));
        };
        // NotStarted -> InProgress (first activation) or Error -> InProgress
        // (retry); identity refreshes never land here.
        let fresh_attempt = new_status == StepStatus::InProgress && from != new_status;
        if fresh_attempt {
            record.attempt_count += 1;
        }
        if record.started_at.is_none()
            && matches!(new_status, StepStatus::InProgress | StepStatus::Started)
        {
            record.started_at = Some(now);
        }
        if new_status == StepStatus::Complete && from != StepStatus::Complete {
            record.completed_at = Some(now);
        }
        record.status = new_status;
        if let Some(data) = captured_data {
            record.captured_data.extend(data);
        }
        record.last_modified = now;

        if new_status == StepStatus::InProgress {
            progress.current_step_id = step_id.to_string();
        }
        progress.recompute_overall();
        debug!(step_id, %from, %new_status, "step status updated");
        Ok(progress)
    }

    /// Begins a fresh attempt on a previously visited step.
    ///
    /// This is the one door back into a step whose current attempt ended
    /// (`complete` or `error`) and the re-entry path for a step abandoned
    /// mid-conversation. The status returns to `in_progress`,
    /// `attempt_count` increments, and captured data and transcript are
    /// preserved. A reactivated completed step stops counting as completed
    /// until it completes again.
    pub fn reactivate_step(&self, mut progress: UserProgress, step_id: &str) -> Result<UserProgress> {
        let record = self.step_record(&progress, step_id)?;
        if !record.is_visited() {
            return Err(TrackerError::InvalidTransition {
                step_id: step_id.to_string(),
                from: record.status,
                to: StepStatus::InProgress,
                reason: "only a previously visited step can be reactivated",
            });
        }
        let now = Utc::now();
        let Some(record) = progress.steps.get_mut(step_id) else {
            return Err(self.unknown(step_id));
        };
        record.attempt_count += 1;
        let attempt = record.attempt_count;
        record.status = StepStatus::InProgress;
        record.completed_at = None;
        record.last_modified = now;
        progress.current_step_id = step_id.to_string();
        progress.recompute_overall();
        debug!(step_id, attempt, "step reactivated");
        Ok(progress)
    }

    /// Records the conversation reference the external service handed back.
    pub fn record_conversation(
        &self,
        mut progress: UserProgress,
        step_id: &str,
        conversation_id: &str,
    ) -> Result<UserProgress> {
        self.step_record(&progress, step_id)?;
        let Some(record) = progress.steps.get_mut(step_id) else {
            return Err(self.unknown(step_id));
        };
        record.conversation_id = conversation_id.to_string();
        record.last_modified = Utc::now();
        Ok(progress)
    }

    /// Appends transcript messages to a step, in order, never overwriting
    /// earlier ones.
    pub fn append_messages(
        &self,
        mut progress: UserProgress,
        step_id: &str,
        messages: Vec<Message>,
    ) -> Result<UserProgress> {
        self.step_record(&progress, step_id)?;
        let Some(record) = progress.steps.get_mut(step_id) else {
            return Err(self.unknown(step_id));
        };
        record.messages.extend(messages);
        record.last_modified = Utc::now();
        Ok(progress)
    }

    /// The step immediately following the current step in traversal order,
    /// or `None` when the current step is the last.
    #[must_use]
    pub fn get_next_step<'a>(&'a self, progress: &UserProgress) -> Option<&'a Step> {
        self.workflow.step_after(&progress.current_step_id)
    }

    fn step_record<'a>(&self, progress: &'a UserProgress, step_id: &str) -> Result<&'a StepProgress> {
        if !self.workflow.contains(step_id) {
            return Err(self.unknown(step_id));
        }
        progress.steps.get(step_id).ok_or_else(|| self.unknown(step_id))
    }

    fn unknown(&self, step_id: &str) -> TrackerError {
        TrackerError::UnknownStep {
            workflow_id: self.workflow.id.clone(),
            step_id: step_id.to_string(),
        }
    }
}
