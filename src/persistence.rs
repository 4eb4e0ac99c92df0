/*!
Persistence primitives for serializing/deserializing progress aggregates
(used by the JSON file and SQLite stores and any future persistent
backends).

Design Goals:
- Provide explicit serde-friendly structs decoupled from internal
  in-memory representations.
- Keep conversion logic localized (From / TryFrom impls) so store code is
  lean and declarative.
- Round-trip losslessly: timestamps are carried as RFC3339 strings and the
  derived summary is recomputed from step statuses on load rather than
  trusted from the payload.

This module intentionally does NOT perform I/O. It is pure data
transformation and (de)serialization glue.
*/

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    message::Message,
    progress::{CapturedDatum, CapturedValue, OverallProgress, StepProgress, UserProgress},
    types::StepStatus,
    utils::json_ext::JsonSerializable,
};

use miette::Diagnostic;
use thiserror::Error;

/// Bidirectional conversion and serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("missing field: {0}")]
    #[diagnostic(
        code(storypath::persistence::missing_field),
        help("Populate the field in the persisted JSON before conversion.")
    )]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value}")]
    #[diagnostic(
        code(storypath::persistence::invalid_value),
        help("Statuses and timestamps must use their stable persisted forms.")
    )]
    InvalidValue { field: &'static str, value: String },

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(storypath::persistence::serde),
        help("Ensure the JSON structure matches the Persisted* types.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Blanket implementation of JsonSerializable for all suitable types using PersistenceError.
impl<T> JsonSerializable<PersistenceError> for T
where
    T: serde::Serialize + for<'de> serde::de::DeserializeOwned,
{
    fn to_json_string(&self) -> std::result::Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(|e| PersistenceError::Serde { source: e })
    }

    fn from_json_str(s: &str) -> std::result::Result<Self, PersistenceError> {
        serde_json::from_str(s).map_err(|e| PersistenceError::Serde { source: e })
    }
}

/// Persisted shape of one captured datum. Capture time as RFC3339 string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCapturedDatum {
    pub label: String,
    pub value: CapturedValue,
    pub captured_at: String,
}

/// Persisted shape of one step record.
///
/// Statuses use [`StepStatus::encode`] strings; timestamps are RFC3339
/// strings (keeps `chrono::DateTime` out of the serialized shape).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedStepProgress {
    pub step_id: String,
    pub status: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub last_modified: String,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub captured_data: Vec<PersistedCapturedDatum>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Persisted shape of the derived summary.
///
/// Stored for readability of the on-disk document; conversion back into a
/// [`UserProgress`] recomputes the summary from the step records instead of
/// trusting these numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedOverall {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub percent_complete: f64,
}

/// Full persisted shape of a session's progress aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedUserProgress {
    pub session_id: String,
    pub workflow_id: String,
    pub current_step_id: String,
    #[serde(default)]
    pub steps: FxHashMap<String, PersistedStepProgress>,
    pub overall: PersistedOverall,
}

fn parse_rfc3339(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PersistenceError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

/* ---------- CapturedDatum <-> PersistedCapturedDatum ---------- */

impl From<&CapturedDatum> for PersistedCapturedDatum {
    fn from(d: &CapturedDatum) -> Self {
        PersistedCapturedDatum {
            label: d.label.clone(),
            value: d.value.clone(),
            captured_at: d.captured_at.to_rfc3339(),
        }
    }
}

impl TryFrom<PersistedCapturedDatum> for CapturedDatum {
    type Error = PersistenceError;

    fn try_from(p: PersistedCapturedDatum) -> Result<Self> {
        Ok(CapturedDatum {
            captured_at: parse_rfc3339("captured_at", &p.captured_at)?,
            label: p.label,
            value: p.value,
        })
    }
}

/* ---------- StepProgress <-> PersistedStepProgress ---------- */

impl From<&StepProgress> for PersistedStepProgress {
    fn from(s: &StepProgress) -> Self {
        PersistedStepProgress {
            step_id: s.step_id.clone(),
            status: s.status.encode().to_string(),
            conversation_id: s.conversation_id.clone(),
            started_at: s.started_at.map(|t| t.to_rfc3339()),
            completed_at: s.completed_at.map(|t| t.to_rfc3339()),
            last_modified: s.last_modified.to_rfc3339(),
            attempt_count: s.attempt_count,
            captured_data: s.captured_data.iter().map(PersistedCapturedDatum::from).collect(),
            messages: s.messages.clone(),
        }
    }
}

impl TryFrom<PersistedStepProgress> for StepProgress {
    type Error = PersistenceError;

    fn try_from(p: PersistedStepProgress) -> Result<Self> {
        let status =
            StepStatus::decode(&p.status).ok_or_else(|| PersistenceError::InvalidValue {
                field: "status",
                value: p.status.clone(),
            })?;
        let started_at = match p.started_at {
            Some(ref s) => Some(parse_rfc3339("started_at", s)?),
            None => None,
        };
        let completed_at = match p.completed_at {
            Some(ref s) => Some(parse_rfc3339("completed_at", s)?),
            None => None,
        };
        Ok(StepProgress {
            step_id: p.step_id,
            status,
            conversation_id: p.conversation_id,
            started_at,
            completed_at,
            last_modified: parse_rfc3339("last_modified", &p.last_modified)?,
            attempt_count: p.attempt_count,
            captured_data: p
                .captured_data
                .into_iter()
                .map(CapturedDatum::try_from)
                .collect::<Result<Vec<_>>>()?,
            messages: p.messages,
        })
    }
}

/* ---------- UserProgress <-> PersistedUserProgress ---------- */

impl From<&UserProgress> for PersistedUserProgress {
    fn from(u: &UserProgress) -> Self {
        PersistedUserProgress {
            session_id: u.session_id.clone(),
            workflow_id: u.workflow_id.clone(),
            current_step_id: u.current_step_id.clone(),
            steps: u
                .steps
                .iter()
                .map(|(id, record)| (id.clone(), PersistedStepProgress::from(record)))
                .collect(),
            overall: PersistedOverall {
                total_steps: u.overall.total_steps,
                completed_steps: u.overall.completed_steps,
                percent_complete: u.overall.percent_complete,
            },
        }
    }
}

impl TryFrom<PersistedUserProgress> for UserProgress {
    type Error = PersistenceError;

    fn try_from(p: PersistedUserProgress) -> Result<Self> {
        let steps = p
            .steps
            .into_iter()
            .map(|(id, record)| StepProgress::try_from(record).map(|r| (id, r)))
            .collect::<Result<FxHashMap<_, _>>>()?;
        // Derived summary is a function of the step records; recompute
        // instead of trusting the stored copy.
        let overall = OverallProgress::recompute(steps.len(), steps.values().map(|s| s.status));
        Ok(UserProgress {
            session_id: p.session_id,
            workflow_id: p.workflow_id,
            current_step_id: p.current_step_id,
            steps,
            overall,
        })
    }
}
