/*!
SQLite-backed progress store.

## Behavior

- Stores one row per session in `progress_sessions`, with the full
  aggregate encoded through the persistence models (see
  `crate::persistence`) as a JSON document.
- Every save is an upsert that refreshes `updated_at`, so
  `list_sessions` can order by recency.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) are executed on connect;
  disabling the feature assumes external migration orchestration.

## Design Goals

- Keep this module focused on database I/O; pure serialization lives in
  the persistence module.
- Surface every failure to the caller; no internal retry.
*/

use std::sync::Arc;

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::persistence::PersistedUserProgress;
use crate::progress::UserProgress;
use crate::store::{ProgressStore, Result, StoreError};
use crate::utils::json_ext::{deserialize_with_context, serialize_with_context};

/// Durable progress store over a SQLite database.
pub struct SqliteProgressStore {
    /// Shared connection pool for concurrent session operations.
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteProgressStore").finish()
    }
}

fn decode_error(e: serde_json::Error, context: &str) -> StoreError {
    StoreError::Decode {
        message: format!("{context}: {e}"),
    }
}

impl SqliteProgressStore {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: `"sqlite://storypath.db?mode=rwc"`.
    #[must_use = "store must be used to persist progress"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("connect error: {e}"),
            })?;
        // Run embedded migrations only if the feature is enabled (idempotent).
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(StoreError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        #[cfg(not(feature = "sqlite-migrations"))]
        {
            // Feature disabled: assume the schema was applied externally.
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait::async_trait]
impl ProgressStore for SqliteProgressStore {
    #[instrument(skip(self), err)]
    async fn load(&self, session_id: &str) -> Result<Option<UserProgress>> {
        let row = sqlx::query(
            r#"
            SELECT progress_json FROM progress_sessions
            WHERE id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("select session: {e}"),
        })?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let payload: String = row.get("progress_json");
        let persisted: PersistedUserProgress =
            deserialize_with_context(&payload, "progress_json", decode_error)?;
        let progress = UserProgress::try_from(persisted)?;
        Ok(Some(progress))
    }

    #[instrument(skip(self, progress), fields(session_id = %progress.session_id), err)]
    async fn save(&self, progress: &UserProgress) -> Result<()> {
        let persisted = PersistedUserProgress::from(progress);
        let payload = serialize_with_context(&persisted, "progress_json", decode_error)?;

        sqlx::query(
            r#"
            INSERT INTO progress_sessions (id, workflow_id, progress_json, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                workflow_id = excluded.workflow_id,
                progress_json = excluded.progress_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&progress.session_id)
        .bind(&progress.workflow_id)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("upsert session: {e}"),
        })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM progress_sessions WHERE id = ?1
            "#,
        )
        .bind(session_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("delete session: {e}"),
        })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM progress_sessions
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| StoreError::Backend {
            message: format!("list sessions: {e}"),
        })?;

        Ok(rows.into_iter().map(|r| r.get::<String, _>("id")).collect())
    }
}
