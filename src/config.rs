//! Runtime configuration for embedding applications.
//!
//! Resolution order for each knob: explicit value, then environment (via
//! `dotenvy`), then a built-in default. Environment keys:
//!
//! - `STORYPATH_STORE` — `memory`, `json`, or `sqlite`
//! - `STORYPATH_DB_NAME` — SQLite database file name
//! - `STORYPATH_DATA_DIR` — directory for JSON session documents

use crate::store::StoreType;
use crate::utils::id_generator::IdGenerator;

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub session_id: Option<String>,
    pub store: Option<StoreType>,
    pub sqlite_db_name: Option<String>,
    pub data_dir: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            session_id: Some(IdGenerator::new().generate_session_id()),
            store: Self::resolve_store(None),
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
            data_dir: Self::resolve_data_dir(None),
        }
    }
}

impl TrackerConfig {
    fn resolve_store(provided: Option<StoreType>) -> Option<StoreType> {
        if provided.is_some() {
            return provided;
        }
        dotenvy::dotenv().ok();
        match std::env::var("STORYPATH_STORE").ok().as_deref() {
            Some("json") => Some(StoreType::JsonFile),
            Some("sqlite") => Some(StoreType::Sqlite),
            _ => Some(StoreType::InMemory),
        }
    }

    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if let Some(name) = provided {
            return Some(name);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("STORYPATH_DB_NAME").unwrap_or_else(|_| "storypath.db".to_string()))
    }

    fn resolve_data_dir(provided: Option<String>) -> Option<String> {
        if let Some(dir) = provided {
            return Some(dir);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("STORYPATH_DATA_DIR").unwrap_or_else(|_| "./sessions".to_string()))
    }

    pub fn new(
        session_id: Option<String>,
        store: Option<StoreType>,
        sqlite_db_name: Option<String>,
        data_dir: Option<String>,
    ) -> Self {
        Self {
            session_id,
            store: Self::resolve_store(store),
            sqlite_db_name: Self::resolve_sqlite_db_name(sqlite_db_name),
            data_dir: Self::resolve_data_dir(data_dir),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: StoreType) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generates_a_session_id() {
        let config = TrackerConfig::default();
        let id = config.session_id.expect("session id");
        assert!(id.starts_with("session-"));
        assert!(config.sqlite_db_name.is_some());
        assert!(config.data_dir.is_some());
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let config = TrackerConfig::new(
            Some("session-fixed".to_string()),
            Some(StoreType::JsonFile),
            Some("custom.db".to_string()),
            Some("/tmp/sessions".to_string()),
        );
        assert_eq!(config.session_id.as_deref(), Some("session-fixed"));
        assert_eq!(config.store, Some(StoreType::JsonFile));
        assert_eq!(config.sqlite_db_name.as_deref(), Some("custom.db"));
        assert_eq!(config.data_dir.as_deref(), Some("/tmp/sessions"));
    }

    #[test]
    fn builder_overrides() {
        let config = TrackerConfig::default()
            .with_store(StoreType::Sqlite)
            .with_session_id("session-abc");
        assert_eq!(config.store, Some(StoreType::Sqlite));
        assert_eq!(config.session_id.as_deref(), Some("session-abc"));
    }
}
