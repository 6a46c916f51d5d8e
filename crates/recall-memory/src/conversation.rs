//! Hybrid conversation storage: SQLite metadata index plus sharded JSON
//! content files.
//!
//! The index answers listing and filtering queries without touching full
//! payloads; the files hold the complete record, one per conversation,
//! human-inspectable for debugging. Content writes go through a temp file
//! and an atomic rename, so readers observe either the old or the new
//! record, never a torn one. The file is the source of truth: `get` reads
//! it directly and ignores the index.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{Result, StorageError};
use crate::models::{Conversation, ConversationStats};

#[derive(Debug, Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
    conversations_dir: PathBuf,
}

impl ConversationStore {
    /// Open (or create) the store rooted at `data_dir`.
    ///
    /// Creates `<data_dir>/conversations.db` and the
    /// `<data_dir>/conversations/` shard tree, and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created, the database
    /// cannot be opened, or migrations fail.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let conversations_dir = data_dir.join("conversations");
        tokio::fs::create_dir_all(&conversations_dir).await?;

        let db_path = data_dir.join("conversations.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            conversations_dir,
        })
    }

    /// File path for a conversation's content.
    ///
    /// The first two bytes of the id pick the shard directory; ids shorter
    /// than two bytes (or split mid-character) land in bucket `00`.
    fn conversation_path(&self, id: &str) -> PathBuf {
        let shard = match id.get(..2) {
            Some(prefix) if id.len() >= 2 => prefix,
            _ => "00",
        };
        self.conversations_dir.join(shard).join(format!("{id}.json"))
    }

    /// Save a conversation: content file first, index row second.
    ///
    /// The file write is temp-then-rename, so a crash never leaves a
    /// half-written file. A crash between the two steps leaves the index
    /// stale relative to the file; [`Self::reconcile`] recovers the
    /// missing-row case.
    ///
    /// # Errors
    ///
    /// Returns an error if the file write or the index upsert fails.
    pub async fn save(&self, conversation: &Conversation) -> Result<()> {
        let path = self.conversation_path(&conversation.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(conversation)?;
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &content).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        self.upsert_index_row(conversation).await?;
        tracing::debug!(id = %conversation.id, "saved conversation");
        Ok(())
    }

    async fn upsert_index_row(&self, conversation: &Conversation) -> Result<()> {
        let message_count = i64::try_from(conversation.messages.len()).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT OR REPLACE INTO conversations \
             (id, source, project_path, created_at, updated_at, indexed_at, title, message_count) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&conversation.id)
        .bind(&conversation.source)
        .bind(&conversation.project_path)
        .bind(ts(conversation.created_at))
        .bind(ts(conversation.updated_at))
        .bind(conversation.indexed_at.map(ts))
        .bind(&conversation.title)
        .bind(message_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read a conversation directly from its content file, bypassing the
    /// index entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        match self.read_record(id).await {
            Ok(conversation) => Ok(Some(conversation)),
            Err(StorageError::ConversationNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn read_record(&self, id: &str) -> Result<Conversation> {
        let path = self.conversation_path(id);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::ConversationNotFound { id: id.to_owned() });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&content)?)
    }

    /// Delete a conversation's file and index row.
    ///
    /// The index row is removed unconditionally. Returns whether the
    /// content file existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file removal or the index delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.conversation_path(id);
        let existed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id, existed, "deleted conversation");
        Ok(existed)
    }

    /// List conversations ordered by `updated_at` descending.
    ///
    /// Rows whose content file has gone missing are silently skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query or a file read fails.
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Conversation>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM conversations ORDER BY updated_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// List conversations for a project, `updated_at` descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query or a file read fails.
    pub async fn list_by_project(
        &self,
        project_path: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM conversations WHERE project_path = ? \
             ORDER BY updated_at DESC LIMIT ? OFFSET ?",
        )
        .bind(project_path)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// List conversations created within `[start, end]` (inclusive bounds),
    /// optionally filtered to an exact source, `created_at` descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query or a file read fails.
    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Conversation>> {
        let rows: Vec<(String,)> = if let Some(source) = source {
            sqlx::query_as(
                "SELECT id FROM conversations \
                 WHERE created_at >= ? AND created_at <= ? AND source = ? \
                 ORDER BY created_at DESC LIMIT ?",
            )
            .bind(ts(start))
            .bind(ts(end))
            .bind(source)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT id FROM conversations \
                 WHERE created_at >= ? AND created_at <= ? \
                 ORDER BY created_at DESC LIMIT ?",
            )
            .bind(ts(start))
            .bind(ts(end))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        self.hydrate(rows).await
    }

    /// List conversations not yet vectorized, oldest first.
    ///
    /// This is the work queue for an external indexer.
    ///
    /// # Errors
    ///
    /// Returns an error if the index query or a file read fails.
    pub async fn list_unindexed(&self, limit: i64) -> Result<Vec<Conversation>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM conversations WHERE indexed_at IS NULL \
             ORDER BY created_at ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn hydrate(&self, rows: Vec<(String,)>) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::with_capacity(rows.len());
        for (id,) in rows {
            if let Some(conversation) = self.get(&id).await? {
                conversations.push(conversation);
            }
        }
        Ok(conversations)
    }

    /// Mark a conversation as indexed, updating both the index row and the
    /// content file so the two agree.
    ///
    /// No-op if the conversation no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the index update or the re-save fails.
    pub async fn mark_indexed(&self, id: &str, indexed_at: Option<DateTime<Utc>>) -> Result<()> {
        let at = indexed_at.unwrap_or_else(Utc::now);

        sqlx::query("UPDATE conversations SET indexed_at = ? WHERE id = ?")
            .bind(ts(at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if let Some(mut conversation) = self.get(id).await? {
            conversation.indexed_at = Some(at);
            self.save(&conversation).await?;
        }
        Ok(())
    }

    /// Aggregate counts over the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_stats(&self) -> Result<ConversationStats> {
        let row: (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(CASE WHEN indexed_at IS NOT NULL THEN 1 END), \
                    COUNT(DISTINCT project_path) \
             FROM conversations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ConversationStats {
            total: row.0,
            indexed: row.1,
            unique_projects: row.2,
        })
    }

    /// Re-insert index rows for content files the index has no row for.
    ///
    /// This closes the crash window between the file write and the index
    /// upsert in [`Self::save`]. Returns the number of rows recovered.
    ///
    /// # Errors
    ///
    /// Returns an error if the shard tree cannot be walked or a recovered
    /// file cannot be read.
    pub async fn reconcile(&self) -> Result<u64> {
        let mut recovered = 0_u64;

        let mut shards = tokio::fs::read_dir(&self.conversations_dir).await?;
        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }
            let mut files = tokio::fs::read_dir(shard.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let path = file.path();
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let known: Option<(i64,)> =
                    sqlx::query_as("SELECT 1 FROM conversations WHERE id = ?")
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await?;
                if known.is_some() {
                    continue;
                }

                let conversation = self.read_record(id).await?;
                self.upsert_index_row(&conversation).await?;
                tracing::warn!(id, "recovered index row from orphaned content file");
                recovered += 1;
            }
        }

        Ok(recovered)
    }

    /// Close the database pool. Idempotent.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Index timestamps are RFC 3339 UTC with fixed microsecond precision, so
/// lexicographic comparison in SQL matches chronological order.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}
