//! # Storypath: Conversational Workflow Progress Tracking
//!
//! Storypath tracks a session's traversal through an ordered sequence of
//! conversational steps — the kind of guided, agent-led flow a story-building
//! app walks a child through — with a validated per-step lifecycle, derived
//! progress views, and a pluggable persistence seam.
//!
//! ## Core Concepts
//!
//! - **Workflow**: the immutable ordered Section/Step definition for a session
//! - **UserProgress**: the per-session aggregate of step records plus summary
//! - **Tracker**: pure transition functions enforcing the step state machine
//! - **Store**: key-value persistence keyed by session id
//! - **Session**: the runtime binding tracker + store, flushing every change
//!
//! ## Quick Start
//!
//! ### Tracking progress
//!
//! ```
//! use storypath::tracker::ProgressTracker;
//! use storypath::types::StepStatus;
//! use storypath::workflow::Workflow;
//!
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .section("setup", "Story Setup")
//!     .step("hero", "Meet your hero", "agent_hero")
//!     .step("setting", "Pick a setting", "agent_setting")
//!     .build();
//!
//! let tracker = ProgressTracker::new(workflow);
//! let progress = tracker.create_new_progress("session-1");
//! assert_eq!(progress.overall.percent_complete, 0.0);
//!
//! // Aggregates are passed by value and a new one is returned; the caller
//! // replaces its held reference.
//! let progress = tracker
//!     .update_step_status(progress, "hero", StepStatus::InProgress, None)
//!     .unwrap();
//! let progress = tracker
//!     .update_step_status(progress, "hero", StepStatus::Complete, None)
//!     .unwrap();
//! assert_eq!(progress.overall.completed_steps, 1);
//! ```
//!
//! ### Capturing conversation data
//!
//! ```
//! use storypath::progress::CapturedDatum;
//! use storypath::tracker::ProgressTracker;
//! use storypath::types::StepStatus;
//! use storypath::workflow::Workflow;
//!
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .step("hero", "Meet your hero", "agent_hero")
//!     .build();
//! let tracker = ProgressTracker::new(workflow);
//!
//! let progress = tracker.create_new_progress("session-1");
//! let progress = tracker
//!     .update_step_status(
//!         progress,
//!         "hero",
//!         StepStatus::InProgress,
//!         Some(vec![CapturedDatum::text("hero_name", "Луна")]),
//!     )
//!     .unwrap();
//! assert_eq!(progress.step("hero").unwrap().captured_data.len(), 1);
//! ```
//!
//! ### Running a persistent session
//!
//! ```rust,no_run
//! use storypath::session::ProgressSession;
//! use storypath::store::JsonFileStore;
//! use storypath::tracker::ProgressTracker;
//! use storypath::types::StepStatus;
//! use storypath::workflow::Workflow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = Workflow::builder("story_builder", "Build a Story")
//!     .step("hero", "Meet your hero", "agent_hero")
//!     .build();
//! let tracker = ProgressTracker::new(workflow);
//! let store = JsonFileStore::open("./sessions").await?;
//!
//! let (mut session, _init) = ProgressSession::open(tracker, store, "session-1").await?;
//! session.activate_step("hero").await?;
//! session.record_conversation("hero", "conv_8842").await?;
//! session.update_status("hero", StepStatus::Complete, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`workflow`] - Immutable Section/Step definitions and traversal order
//! - [`types`] - Step statuses and the transition predicate
//! - [`progress`] - Step records, captured data, and the session aggregate
//! - [`tracker`] - Pure transition functions and the activation policy
//! - [`message`] - Role-tagged transcript messages
//! - [`persistence`] - Serde-friendly persisted shapes and conversions
//! - [`store`] - Persistence backends (in-memory, JSON files, SQLite)
//! - [`session`] - Load-or-create runtime with write-per-event flushing
//! - [`config`] - Environment-aware runtime configuration
//! - [`telemetry`] - Tracing subscriber helpers

pub mod config;
pub mod message;
pub mod persistence;
pub mod progress;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod types;
pub mod utils;
pub mod workflow;
