//! Core status vocabulary for step traversal.
//!
//! This module defines [`StepStatus`], the per-step lifecycle state, and the
//! transition predicate that every status change in the tracker is validated
//! against. The lifecycle is deliberately small:
//!
//! ```text
//! not_started ──► in_progress ──► started ──► complete
//!                     │     │        │
//!                     │     └────────┴──► error ──► in_progress (retry)
//!                     └────────► complete
//! ```
//!
//! `complete` and `error` end the current attempt. An errored step may retry
//! straight back into `in_progress`; a completed step is only re-entered
//! through the tracker's explicit reactivation operation, which starts a
//! fresh attempt.
//!
//! # Examples
//!
//! ```rust
//! use storypath::types::StepStatus;
//!
//! assert!(StepStatus::NotStarted.can_transition_to(StepStatus::InProgress));
//! assert!(!StepStatus::NotStarted.can_transition_to(StepStatus::Complete));
//! assert!(StepStatus::Error.can_transition_to(StepStatus::InProgress));
//!
//! // Stable string forms for persistence backends
//! assert_eq!(StepStatus::InProgress.encode(), "in_progress");
//! assert_eq!(StepStatus::decode("complete"), Some(StepStatus::Complete));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single workflow step.
///
/// Statuses serialize in snake_case; [`encode`](Self::encode) and
/// [`decode`](Self::decode) provide the same stable strings for backends
/// that store statuses as bare text rather than through serde.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step has never been entered.
    #[default]
    NotStarted,
    /// The step has been activated and a conversation is being set up.
    InProgress,
    /// The step's conversation is underway.
    Started,
    /// The step finished successfully.
    Complete,
    /// The current attempt failed. Terminal for the attempt, not the step.
    Error,
}

impl StepStatus {
    /// Returns `true` if the requested status change is a legal edge of the
    /// step state machine.
    ///
    /// Identity transitions (`in_progress -> in_progress` and so on) are
    /// legal for every status except `not_started`: callers may re-send the
    /// current status to refresh a record without it counting as a new
    /// attempt. No status transitions back *into* `not_started`; discarding
    /// progress happens at the aggregate level.
    #[must_use]
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        use StepStatus::*;
        match (self, next) {
            (_, NotStarted) => false,
            (from, to) if from == to => true,
            (NotStarted, InProgress) => true,
            (InProgress, Started | Complete | Error) => true,
            (Started, Complete | Error) => true,
            (Error, InProgress) => true,
            _ => false,
        }
    }

    /// Returns `true` for statuses that end the current attempt.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Error)
    }

    /// Stable string form used by persistence backends.
    #[must_use]
    pub fn encode(self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Started => "started",
            StepStatus::Complete => "complete",
            StepStatus::Error => "error",
        }
    }

    /// Parse a persisted string form back into a status.
    ///
    /// Returns `None` for unrecognized input; statuses are a closed set and
    /// silently mapping unknown strings would corrupt progress summaries.
    #[must_use]
    pub fn decode(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(StepStatus::NotStarted),
            "in_progress" => Some(StepStatus::InProgress),
            "started" => Some(StepStatus::Started),
            "complete" => Some(StepStatus::Complete),
            "error" => Some(StepStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StepStatus::*;

    #[test]
    fn forward_edges_are_legal() {
        assert!(NotStarted.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Started));
        assert!(InProgress.can_transition_to(Complete));
        assert!(Started.can_transition_to(Complete));
        assert!(InProgress.can_transition_to(Error));
        assert!(Started.can_transition_to(Error));
        assert!(Error.can_transition_to(InProgress));
    }

    #[test]
    fn shortcut_and_backward_edges_are_rejected() {
        assert!(!NotStarted.can_transition_to(Complete));
        assert!(!NotStarted.can_transition_to(Started));
        assert!(!NotStarted.can_transition_to(Error));
        assert!(!Complete.can_transition_to(InProgress));
        assert!(!Complete.can_transition_to(Started));
        assert!(!Started.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(NotStarted));
    }

    #[test]
    fn identity_transitions_allow_idempotent_refresh() {
        for status in [InProgress, Started, Complete, Error] {
            assert!(status.can_transition_to(status), "{status} -> {status}");
        }
        assert!(!NotStarted.can_transition_to(NotStarted));
    }

    #[test]
    fn terminal_statuses() {
        assert!(Complete.is_terminal());
        assert!(Error.is_terminal());
        assert!(!NotStarted.is_terminal());
        assert!(!InProgress.is_terminal());
        assert!(!Started.is_terminal());
    }

    #[test]
    fn encode_decode_round_trip() {
        for status in [NotStarted, InProgress, Started, Complete, Error] {
            assert_eq!(StepStatus::decode(status.encode()), Some(status));
        }
        assert_eq!(StepStatus::decode("finished"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        let back: StepStatus = serde_json::from_str("\"started\"").expect("deserialize");
        assert_eq!(back, Started);
    }
}
