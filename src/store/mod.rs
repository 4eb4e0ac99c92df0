//! Pluggable persistence for progress aggregates.
//!
//! The tracker treats storage as an opaque key-value collaborator keyed by
//! session id. A store must make each write observable (success or failure)
//! before the caller issues its next operation — no batching or coalescing —
//! so rapid successive updates cannot overwrite each other. Failures are
//! surfaced to the caller; stores never retry internally. Retry policy
//! belongs to whoever owns the user-facing action.
//!
//! # Backends
//!
//! - [`InMemoryProgressStore`] — volatile map for tests and development
//! - [`JsonFileStore`] — one JSON document per session on the filesystem
//! - `SqliteProgressStore` — durable sqlx-backed storage (feature `sqlite`)

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::progress::UserProgress;

pub mod json_file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use json_file::JsonFileStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProgressStore;

/// Failures surfaced by a progress store.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("storage backend error: {message}")]
    #[diagnostic(
        code(storypath::store::backend),
        help("Check that the storage location is reachable and writable.")
    )]
    Backend { message: String },

    #[error("stored progress could not be decoded: {message}")]
    #[diagnostic(
        code(storypath::store::decode),
        help("The persisted payload does not match the PersistedUserProgress shape.")
    )]
    Decode { message: String },

    #[error("store error: {message}")]
    #[diagnostic(code(storypath::store::other))]
    Other { message: String },
}

impl From<PersistenceError> for StoreError {
    fn from(e: PersistenceError) -> Self {
        StoreError::Decode {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Which storage backend a session should use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreType {
    /// Volatile in-process map.
    InMemory,
    /// One JSON document per session under a data directory.
    JsonFile,
    /// SQLite database (requires the `sqlite` feature).
    Sqlite,
}

/// Key-value persistence surface for [`UserProgress`] aggregates.
///
/// Implementations must be safe to share across tasks; each method call is
/// one complete, observable operation.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Loads the aggregate persisted for `session_id`, if any.
    async fn load(&self, session_id: &str) -> Result<Option<UserProgress>>;

    /// Persists an aggregate, replacing any prior copy for its session.
    async fn save(&self, progress: &UserProgress) -> Result<()>;

    /// Removes the persisted copy for `session_id`. Deleting an absent
    /// session is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Ids of all sessions with a persisted aggregate.
    async fn list_sessions(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl<S: ProgressStore + ?Sized> ProgressStore for Arc<S> {
    async fn load(&self, session_id: &str) -> Result<Option<UserProgress>> {
        (**self).load(session_id).await
    }

    async fn save(&self, progress: &UserProgress) -> Result<()> {
        (**self).save(progress).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        (**self).delete(session_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        (**self).list_sessions().await
    }
}

/// Volatile store for testing and development. Nothing survives the
/// process.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    sessions: RwLock<FxHashMap<String, UserProgress>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Other {
            message: "progress map lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn load(&self, session_id: &str) -> Result<Option<UserProgress>> {
        let sessions = self.sessions.read().map_err(|_| Self::poisoned())?;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, progress: &UserProgress) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Self::poisoned())?;
        sessions.insert(progress.session_id.clone(), progress.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Self::poisoned())?;
        sessions.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.read().map_err(|_| Self::poisoned())?;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
