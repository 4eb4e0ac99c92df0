//! Progress aggregates: per-step records and the per-session root.
//!
//! The types here are plain data. All lifecycle rules — which transitions
//! are legal, when attempts increment, when the summary is recomputed — live
//! in [`crate::tracker`]; all serialization shapes live in
//! [`crate::persistence`].
//!
//! # Core Types
//!
//! - [`UserProgress`]: aggregate root for one session
//! - [`StepProgress`]: mutable record tracking one step's traversal state
//! - [`OverallProgress`]: derived summary, always recomputed from step statuses
//! - [`CapturedDatum`] / [`CapturedValue`]: data extracted from conversations
//!
//! # Examples
//!
//! ```rust
//! use storypath::progress::{CapturedDatum, CapturedValue};
//!
//! let datum = CapturedDatum::text("hero_name", "Луна");
//! assert_eq!(datum.label, "hero_name");
//! assert!(matches!(datum.value, CapturedValue::Text { .. }));
//! ```

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;
use crate::types::StepStatus;

/// A value extracted from a step's conversation.
///
/// The known data-collection kinds are enumerated; `Extra` carries an open
/// map only for fields no schema anticipates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapturedValue {
    /// Free-text answer, e.g. a character name or plot idea.
    Text { value: String },
    /// Numeric answer, e.g. an age or a count of dragons.
    Number { value: f64 },
    /// Yes/no answer.
    Flag { value: bool },
    /// Fields with no schema known ahead of time.
    Extra { fields: FxHashMap<String, Value> },
}

/// One labeled value captured from a conversation, with capture time.
///
/// Captured data on a step is an ordered, append-only list: later captures
/// never overwrite earlier ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapturedDatum {
    pub label: String,
    pub value: CapturedValue,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl CapturedDatum {
    /// Creates a datum captured now.
    #[must_use]
    pub fn new(label: &str, value: CapturedValue) -> Self {
        Self {
            label: label.to_string(),
            value,
            captured_at: Utc::now(),
        }
    }

    /// Creates a free-text datum captured now.
    #[must_use]
    pub fn text(label: &str, value: &str) -> Self {
        Self::new(
            label,
            CapturedValue::Text {
                value: value.to_string(),
            },
        )
    }

    /// Creates a numeric datum captured now.
    #[must_use]
    pub fn number(label: &str, value: f64) -> Self {
        Self::new(label, CapturedValue::Number { value })
    }

    /// Creates a yes/no datum captured now.
    #[must_use]
    pub fn flag(label: &str, value: bool) -> Self {
        Self::new(label, CapturedValue::Flag { value })
    }
}

/// Mutable record tracking one step's traversal state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Id of the step this record tracks.
    pub step_id: String,
    /// Current lifecycle state.
    pub status: StepStatus,
    /// Opaque reference handed back by the conversation service.
    /// Empty until a conversation starts.
    #[serde(default)]
    pub conversation_id: String,
    /// When the step first entered `in_progress`, if it ever has.
    pub started_at: Option<DateTime<Utc>>,
    /// When the current attempt completed, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Refreshed on every write to this record. Always >= `started_at`.
    pub last_modified: DateTime<Utc>,
    /// Number of attempts begun on this step. Monotonically non-decreasing.
    #[serde(default)]
    pub attempt_count: u32,
    /// Values extracted from the conversation, in capture order.
    #[serde(default)]
    pub captured_data: Vec<CapturedDatum>,
    /// Transcript of the step's conversation, in utterance order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl StepProgress {
    /// A record for a step that has never been entered.
    #[must_use]
    pub fn fresh(step_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::NotStarted,
            conversation_id: String::new(),
            started_at: None,
            completed_at: None,
            last_modified: at,
            attempt_count: 0,
            captured_data: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Returns `true` once the step has been entered at least once.
    #[must_use]
    pub fn is_visited(&self) -> bool {
        self.status != StepStatus::NotStarted
    }
}

/// Derived summary of a session's traversal.
///
/// Never stored independently of its inputs: whenever any step's status
/// changes, the tracker recomputes this from the step records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverallProgress {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub percent_complete: f64,
}

impl OverallProgress {
    /// A summary with nothing completed.
    #[must_use]
    pub fn zeroed(total_steps: usize) -> Self {
        Self {
            total_steps,
            completed_steps: 0,
            percent_complete: 0.0,
        }
    }

    /// Recomputes the summary from step statuses.
    #[must_use]
    pub fn recompute(total_steps: usize, statuses: impl Iterator<Item = StepStatus>) -> Self {
        let completed_steps = statuses.filter(|s| *s == StepStatus::Complete).count();
        let percent_complete = if total_steps == 0 {
            0.0
        } else {
            completed_steps as f64 / total_steps as f64 * 100.0
        };
        Self {
            total_steps,
            completed_steps,
            percent_complete,
        }
    }

    /// Returns `true` when every step has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total_steps > 0 && self.completed_steps == self.total_steps
    }
}

/// Aggregate root for one session's traversal.
///
/// Holds one [`StepProgress`] entry per step of the loaded workflow (keys
/// are step ids, unique) plus the derived summary. Aggregates are passed by
/// value through the tracker's pure transition functions: each operation
/// returns a new aggregate and the caller replaces its held reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    /// Session this aggregate belongs to.
    pub session_id: String,
    /// Workflow definition this aggregate was created against.
    pub workflow_id: String,
    /// The step the session is currently on.
    pub current_step_id: String,
    /// Per-step records, keyed by step id.
    pub steps: FxHashMap<String, StepProgress>,
    /// Derived summary, recomputed on every status change.
    pub overall: OverallProgress,
}

impl UserProgress {
    /// Looks up the record for a step.
    #[must_use]
    pub fn step(&self, step_id: &str) -> Option<&StepProgress> {
        self.steps.get(step_id)
    }

    /// Recomputes the derived summary from the current step records.
    pub(crate) fn recompute_overall(&mut self) {
        self.overall =
            OverallProgress::recompute(self.steps.len(), self.steps.values().map(|s| s.status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_unvisited_and_empty() {
        let at = Utc::now();
        let record = StepProgress::fresh("s1", at);
        assert_eq!(record.status, StepStatus::NotStarted);
        assert!(!record.is_visited());
        assert_eq!(record.attempt_count, 0);
        assert!(record.conversation_id.is_empty());
        assert_eq!(record.started_at, None);
        assert_eq!(record.last_modified, at);
        assert!(record.captured_data.is_empty());
        assert!(record.messages.is_empty());
    }

    #[test]
    fn recompute_counts_only_complete() {
        let statuses = [
            StepStatus::Complete,
            StepStatus::InProgress,
            StepStatus::Error,
            StepStatus::Complete,
        ];
        let overall = OverallProgress::recompute(4, statuses.into_iter());
        assert_eq!(overall.completed_steps, 2);
        assert!((overall.percent_complete - 50.0).abs() < f64::EPSILON);
        assert!(!overall.is_finished());
    }

    #[test]
    fn recompute_handles_empty_workflow() {
        let overall = OverallProgress::recompute(0, std::iter::empty());
        assert_eq!(overall.completed_steps, 0);
        assert_eq!(overall.percent_complete, 0.0);
        assert!(!overall.is_finished());
    }

    #[test]
    fn finished_when_all_complete() {
        let overall =
            OverallProgress::recompute(2, [StepStatus::Complete, StepStatus::Complete].into_iter());
        assert!(overall.is_finished());
        assert_eq!(overall.percent_complete, 100.0);
    }

    #[test]
    fn captured_value_serde_is_tagged() {
        let datum = CapturedDatum::number("dragon_count", 3.0);
        let json = serde_json::to_value(&datum).expect("serialize");
        assert_eq!(json["value"]["kind"], "number");
        let back: CapturedDatum = serde_json::from_value(json).expect("deserialize");
        assert_eq!(datum, back);
    }

    #[test]
    fn captured_extra_keeps_open_fields() {
        let mut fields = FxHashMap::default();
        fields.insert("mood".to_string(), serde_json::json!("brave"));
        fields.insert("sidekicks".to_string(), serde_json::json!(["owl", "fox"]));
        let datum = CapturedDatum::new("unplanned", CapturedValue::Extra { fields });
        let json = serde_json::to_string(&datum).expect("serialize");
        let back: CapturedDatum = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(datum, back);
    }
}
