//! JSON-file-backed progress store.
//!
//! One `<session_id>.json` document per session under a data directory.
//! Writes go to a temp file in the same directory and are renamed into
//! place, so a crash mid-write never leaves a truncated document behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::instrument;

use crate::persistence::PersistedUserProgress;
use crate::progress::UserProgress;
use crate::store::{ProgressStore, Result, StoreError};

/// Filesystem store keeping each session as a pretty-printed JSON document.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    #[instrument(skip(dir), err)]
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("create data dir {}: {e}", dir.display()),
            })?;
        Ok(Self { dir })
    }

    /// The directory session documents live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, session_id: &str) -> Result<PathBuf> {
        // Session ids become file names; anything that could escape the
        // data directory is rejected outright.
        if session_id.is_empty()
            || session_id.contains(['/', '\\'])
            || session_id.contains("..")
        {
            return Err(StoreError::Other {
                message: format!("session id '{session_id}' is not a valid document name"),
            });
        }
        Ok(self.dir.join(format!("{session_id}.json")))
    }
}

#[async_trait::async_trait]
impl ProgressStore for JsonFileStore {
    #[instrument(skip(self), err)]
    async fn load(&self, session_id: &str) -> Result<Option<UserProgress>> {
        let path = self.document_path(session_id)?;
        let payload = match fs::read_to_string(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Backend {
                    message: format!("read {}: {e}", path.display()),
                });
            }
        };
        let persisted: PersistedUserProgress =
            serde_json::from_str(&payload).map_err(|e| StoreError::Decode {
                message: format!("{}: {e}", path.display()),
            })?;
        let progress = UserProgress::try_from(persisted)?;
        Ok(Some(progress))
    }

    #[instrument(skip(self, progress), fields(session_id = %progress.session_id), err)]
    async fn save(&self, progress: &UserProgress) -> Result<()> {
        let path = self.document_path(&progress.session_id)?;
        let persisted = PersistedUserProgress::from(progress);
        let payload =
            serde_json::to_string_pretty(&persisted).map_err(|e| StoreError::Decode {
                message: format!("encode session '{}': {e}", progress.session_id),
            })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload.as_bytes())
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("write {}: {e}", tmp.display()),
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("rename {} -> {}: {e}", tmp.display(), path.display()),
            })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.document_path(session_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Backend {
                message: format!("remove {}: {e}", path.display()),
            }),
        }
    }

    #[instrument(skip(self), err)]
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| StoreError::Backend {
            message: format!("read data dir {}: {e}", self.dir.display()),
        })?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| StoreError::Backend {
            message: format!("read data dir {}: {e}", self.dir.display()),
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
