//! Workflow definitions: ordered sections of conversational steps.
//!
//! A [`Workflow`] is the read-only definition loaded once per session before
//! any progress is tracked. It is an ordered list of [`Section`]s, each an
//! ordered list of [`Step`]s; traversal order is the flattened
//! section-then-step order. Definitions are immutable once loaded — all
//! mutation in this crate happens on progress aggregates, never on the
//! workflow itself.
//!
//! # Examples
//!
//! ```rust
//! use storypath::workflow::Workflow;
//!
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .section("setup", "Story Setup")
//!     .step("hero", "Meet your hero", "agent_hero")
//!     .step("setting", "Pick a setting", "agent_setting")
//!     .section("adventure", "The Adventure")
//!     .step("challenge", "Face the challenge", "agent_challenge")
//!     .build();
//!
//! assert_eq!(workflow.len(), 3);
//! assert_eq!(workflow.first_step().map(|s| s.id.as_str()), Some("hero"));
//! assert_eq!(
//!     workflow.step_after("setting").map(|s| s.id.as_str()),
//!     Some("challenge"),
//! );
//! ```

use serde::{Deserialize, Serialize};

/// One unit of the guided conversational workflow.
///
/// A step is conducted by a single external conversational agent, referenced
/// by `agent_id`; the tracker never contacts that agent itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Stable identifier, unique within the workflow.
    pub id: String,
    /// Display title shown in the UI.
    pub title: String,
    /// Identifier of the external conversational agent for this step.
    pub agent_id: String,
}

/// Ordered grouping of steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier, unique within the workflow.
    pub id: String,
    /// Display title shown in the UI.
    pub title: String,
    /// Steps in traversal order.
    pub steps: Vec<Step>,
}

/// The full ordered section/step definition for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Stable identifier for this definition.
    pub id: String,
    /// Display title shown in the UI.
    pub title: String,
    /// Sections in traversal order.
    pub sections: Vec<Section>,
}

impl Workflow {
    /// Starts a fluent builder for a workflow definition.
    #[must_use]
    pub fn builder(id: &str, title: &str) -> WorkflowBuilder {
        WorkflowBuilder::new(id, title)
    }

    /// Iterates all steps in flattened section-then-step traversal order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.sections.iter().flat_map(|section| section.steps.iter())
    }

    /// Total number of steps across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.steps.len()).sum()
    }

    /// Returns `true` if the workflow has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `step_id` names a step of this workflow.
    #[must_use]
    pub fn contains(&self, step_id: &str) -> bool {
        self.step(step_id).is_some()
    }

    /// Looks up a step by id.
    #[must_use]
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps().find(|s| s.id == step_id)
    }

    /// Zero-based position of a step in traversal order.
    #[must_use]
    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps().position(|s| s.id == step_id)
    }

    /// The first step in traversal order, if any.
    #[must_use]
    pub fn first_step(&self) -> Option<&Step> {
        self.steps().next()
    }

    /// The step immediately following `step_id` in traversal order.
    ///
    /// Returns `None` when `step_id` is the last step or is unknown.
    #[must_use]
    pub fn step_after(&self, step_id: &str) -> Option<&Step> {
        let mut steps = self.steps();
        steps.find(|s| s.id == step_id)?;
        steps.next()
    }
}

/// Fluent builder for [`Workflow`] definitions.
///
/// `section` opens a new section; `step` appends to the most recently opened
/// one. A `step` call before any `section` opens an implicit section named
/// `"main"`.
#[derive(Debug)]
pub struct WorkflowBuilder {
    id: String,
    title: String,
    sections: Vec<Section>,
}

impl WorkflowBuilder {
    fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    /// Opens a new section; subsequent `step` calls append to it.
    #[must_use]
    pub fn section(mut self, id: &str, title: &str) -> Self {
        self.sections.push(Section {
            id: id.to_string(),
            title: title.to_string(),
            steps: Vec::new(),
        });
        self
    }

    /// Appends a step to the current section.
    #[must_use]
    pub fn step(mut self, id: &str, title: &str, agent_id: &str) -> Self {
        if self.sections.is_empty() {
            self.sections.push(Section {
                id: "main".to_string(),
                title: "Main".to_string(),
                steps: Vec::new(),
            });
        }
        if let Some(section) = self.sections.last_mut() {
            section.steps.push(Step {
                id: id.to_string(),
                title: title.to_string(),
                agent_id: agent_id.to_string(),
            });
        }
        self
    }

    /// Builds the final workflow.
    #[must_use]
    pub fn build(self) -> Workflow {
        Workflow {
            id: self.id,
            title: self.title,
            sections: self.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_section_workflow() -> Workflow {
        Workflow::builder("wf", "Test Flow")
            .section("a", "Part A")
            .step("s1", "First", "agent_1")
            .step("s2", "Second", "agent_2")
            .section("b", "Part B")
            .step("s3", "Third", "agent_3")
            .build()
    }

    #[test]
    fn flattened_order_crosses_section_boundaries() {
        let wf = two_section_workflow();
        let ids: Vec<&str> = wf.steps().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);
        assert_eq!(wf.len(), 3);
        assert!(!wf.is_empty());
    }

    #[test]
    fn lookup_and_position() {
        let wf = two_section_workflow();
        assert!(wf.contains("s2"));
        assert!(!wf.contains("s9"));
        assert_eq!(wf.position("s3"), Some(2));
        assert_eq!(wf.position("s9"), None);
        assert_eq!(wf.step("s1").map(|s| s.agent_id.as_str()), Some("agent_1"));
    }

    #[test]
    fn step_after_spans_sections_and_ends_at_last() {
        let wf = two_section_workflow();
        assert_eq!(wf.step_after("s1").map(|s| s.id.as_str()), Some("s2"));
        // s2 -> s3 crosses the section boundary
        assert_eq!(wf.step_after("s2").map(|s| s.id.as_str()), Some("s3"));
        assert_eq!(wf.step_after("s3").map(|s| s.id.as_str()), None);
        assert_eq!(wf.step_after("s9").map(|s| s.id.as_str()), None);
    }

    #[test]
    fn step_without_section_opens_implicit_main() {
        let wf = Workflow::builder("wf", "Flat")
            .step("only", "Only step", "agent_only")
            .build();
        assert_eq!(wf.sections.len(), 1);
        assert_eq!(wf.sections[0].id, "main");
        assert_eq!(wf.first_step().map(|s| s.id.as_str()), Some("only"));
    }

    #[test]
    fn serde_round_trip() {
        let wf = two_section_workflow();
        let json = serde_json::to_string(&wf).expect("serialize");
        let back: Workflow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(wf, back);
    }
}
