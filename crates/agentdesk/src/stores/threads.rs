//! Thread repository backed by SQLite.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, instrument};

use super::{ThreadRecord, ThreadStore, ThreadUpdate};

#[derive(Debug, FromRow)]
struct ThreadRow {
    id: String,
    metadata: Option<String>,
}

impl From<ThreadRow> for ThreadRecord {
    fn from(row: ThreadRow) -> Self {
        Self {
            id: row.id,
            metadata: row.metadata,
        }
    }
}

/// Repository for chat thread rows.
#[derive(Debug, Clone)]
pub struct SqliteThreadStore {
    pool: SqlitePool,
}

impl SqliteThreadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a thread. Used by the chat subsystem and by tests.
    #[instrument(skip(self, metadata))]
    pub async fn create_thread(
        &self,
        id: &str,
        title: Option<&str>,
        metadata: Option<&str>,
    ) -> Result<ThreadRecord> {
        debug!("Creating thread: {}", id);

        sqlx::query("INSERT INTO threads (id, title, metadata) VALUES (?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(metadata)
            .execute(&self.pool)
            .await
            .context("Failed to insert thread")?;

        self.get_thread(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Thread not found after creation"))
    }
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    #[instrument(skip(self))]
    async fn get_thread(&self, id: &str) -> Result<Option<ThreadRecord>> {
        let row = sqlx::query_as::<_, ThreadRow>("SELECT id, metadata FROM threads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch thread")?;

        Ok(row.map(ThreadRecord::from))
    }

    #[instrument(skip(self, update))]
    async fn update_thread(&self, id: &str, update: ThreadUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE threads SET metadata = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&update.metadata)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update thread")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Thread not found: {}", id);
        }
        Ok(())
    }
}
