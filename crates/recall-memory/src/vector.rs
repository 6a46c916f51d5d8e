//! Embedding storage: one SQLite-resident `documents` table keyed by
//! document id, vectors stored as little-endian f32 blobs.
//!
//! The store is created with a fixed dimension, recorded in `store_meta`
//! and enforced on every write and reopen. Similarity search filters rows
//! with an optional predicate, then ranks candidates by Euclidean distance
//! computed in process and converts each hit to a [`SearchResult`] with
//! `score = 1/(1+distance)`.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{Result, StorageError};
use crate::models::{Document, DocumentMetadata, SearchResult};

/// Columns a [`DocumentFilter`] may predicate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Source,
    ProjectPath,
    ConversationId,
    ChunkIndex,
}

impl FilterField {
    fn column(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::ProjectPath => "project_path",
            Self::ConversationId => "conversation_id",
            Self::ChunkIndex => "chunk_index",
        }
    }
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: FilterField,
    pub value: FieldValue,
}

/// Exact-match predicate over stored columns, evaluated before ranking.
///
/// `must` conditions all have to hold; `must_not` conditions all have to
/// fail. Compiled to parameterized SQL, never spliced into the query text.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub must: Vec<FieldCondition>,
    pub must_not: Vec<FieldCondition>,
}

impl DocumentFilter {
    #[must_use]
    pub fn source(value: impl Into<String>) -> Self {
        Self::default().and(FilterField::Source, FieldValue::Text(value.into()))
    }

    #[must_use]
    pub fn project_path(value: impl Into<String>) -> Self {
        Self::default().and(FilterField::ProjectPath, FieldValue::Text(value.into()))
    }

    #[must_use]
    pub fn conversation_id(value: impl Into<String>) -> Self {
        Self::default().and(FilterField::ConversationId, FieldValue::Text(value.into()))
    }

    #[must_use]
    pub fn and(mut self, field: FilterField, value: FieldValue) -> Self {
        self.must.push(FieldCondition { field, value });
        self
    }

    #[must_use]
    pub fn and_not(mut self, field: FilterField, value: FieldValue) -> Self {
        self.must_not.push(FieldCondition { field, value });
        self
    }

    fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Render to a SQL predicate plus its bind values.
    fn to_sql(&self) -> (String, Vec<&FieldValue>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();
        for cond in &self.must {
            clauses.push(format!("{} = ?", cond.field.column()));
            binds.push(&cond.value);
        }
        for cond in &self.must_not {
            // IS NOT so that NULL columns pass a must_not condition.
            clauses.push(format!("{} IS NOT ?", cond.field.column()));
            binds.push(&cond.value);
        }
        (clauses.join(" AND "), binds)
    }
}

type DocumentRow = (
    String,         // id
    String,         // text
    Vec<u8>,        // vector
    String,         // source
    Option<String>, // project_path
    Option<String>, // conversation_id
    i64,            // chunk_index
    String,         // created_at
    String,         // extra
);

const DOCUMENT_COLUMNS: &str =
    "id, text, vector, source, project_path, conversation_id, chunk_index, created_at, extra";

#[derive(Debug, Clone)]
pub struct VectorStore {
    pool: SqlitePool,
    dimension: usize,
}

impl VectorStore {
    /// Open (or create) the store at `path` with the given vector width.
    ///
    /// The width is recorded on first creation; reopening an existing
    /// store with a different width fails with `DimensionMismatch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created or
    /// the recorded dimension disagrees with `dimension`.
    pub async fn open(path: &Path, dimension: usize) -> Result<Self> {
        tokio::fs::create_dir_all(path).await?;

        let db_path = path.join("documents.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let store = Self { pool, dimension };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                 id TEXT PRIMARY KEY,
                 text TEXT NOT NULL,
                 vector BLOB NOT NULL,
                 source TEXT NOT NULL,
                 project_path TEXT,
                 conversation_id TEXT,
                 chunk_index INTEGER NOT NULL DEFAULT 0,
                 created_at TEXT NOT NULL,
                 extra TEXT NOT NULL DEFAULT '{}'
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_conversation_id \
             ON documents(conversation_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS store_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;

        let recorded: Option<(String,)> =
            sqlx::query_as("SELECT value FROM store_meta WHERE key = 'dimension'")
                .fetch_optional(&self.pool)
                .await?;

        match recorded {
            Some((value,)) => {
                let recorded = value.parse::<usize>().unwrap_or(0);
                if recorded != self.dimension {
                    return Err(StorageError::DimensionMismatch {
                        expected: recorded,
                        actual: self.dimension,
                    });
                }
            }
            None => {
                sqlx::query("INSERT INTO store_meta (key, value) VALUES ('dimension', ?)")
                    .bind(self.dimension.to_string())
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    /// The vector width this store was created with.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Upsert a single document with its embedding.
    ///
    /// An existing row with the same id is fully replaced.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the embedding width is wrong, or a
    /// database error if the write fails.
    pub async fn add(&self, document: &Document, embedding: &[f32]) -> Result<()> {
        self.check_dimension(embedding)?;

        sqlx::query(&format!(
            "INSERT OR REPLACE INTO documents ({DOCUMENT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&document.id)
        .bind(&document.text)
        .bind(encode_vector(embedding))
        .bind(&document.metadata.source)
        .bind(&document.metadata.project_path)
        .bind(&document.metadata.conversation_id)
        .bind(document.metadata.chunk_index)
        .bind(ts(document.metadata.created_at))
        .bind(serde_json::to_string(&document.metadata.extra)?)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %document.id, "upserted document");
        Ok(())
    }

    /// Upsert multiple documents in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `BatchLengthMismatch` when the slices differ in length,
    /// `DimensionMismatch` for any wrong-width vector, or a database error.
    pub async fn add_batch(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(StorageError::BatchLengthMismatch {
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }
        for embedding in embeddings {
            self.check_dimension(embedding)?;
        }

        let mut tx = self.pool.begin().await?;
        for (document, embedding) in documents.iter().zip(embeddings) {
            sqlx::query(&format!(
                "INSERT OR REPLACE INTO documents ({DOCUMENT_COLUMNS}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))
            .bind(&document.id)
            .bind(&document.text)
            .bind(encode_vector(embedding))
            .bind(&document.metadata.source)
            .bind(&document.metadata.project_path)
            .bind(&document.metadata.conversation_id)
            .bind(document.metadata.chunk_index)
            .bind(ts(document.metadata.created_at))
            .bind(serde_json::to_string(&document.metadata.extra)?)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(count = documents.len(), "upserted document batch");
        Ok(())
    }

    /// Search for the `limit` nearest documents, optionally pre-filtered.
    ///
    /// Results come back nearest first with strictly non-increasing scores.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the query width is wrong, or an error
    /// if the query or row decoding fails.
    pub async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<SearchResult>> {
        self.check_dimension(embedding)?;

        let mut sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents");
        let mut binds: Vec<&FieldValue> = Vec::new();
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            let (clause, values) = filter.to_sql();
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            binds = values;
        }

        let mut query = sqlx::query_as::<_, DocumentRow>(&sql);
        for value in binds {
            query = match value {
                FieldValue::Text(s) => query.bind(s),
                FieldValue::Integer(i) => query.bind(i),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let vector = decode_vector(&row.2, self.dimension)?;
            let distance = l2_distance(embedding, &vector);
            scored.push((distance, row));
        }

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(distance, row)| Ok(SearchResult::from_distance(row_to_document(row)?, distance)))
            .collect()
    }

    /// Point lookup by exact id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        match self.fetch_document(id).await {
            Ok(document) => Ok(Some(document)),
            Err(StorageError::DocumentNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_document(&self, id: &str) -> Result<Document> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| StorageError::DocumentNotFound { id: id.to_owned() })?;
        row_to_document(row)
    }

    /// Remove a document by id. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove all documents belonging to a conversation.
    ///
    /// Returns the number removed, counted by querying matches before the
    /// delete — not guaranteed exact under concurrent writers.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    pub async fn delete_by_conversation(&self, conversation_id: &str) -> Result<u64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM documents WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await?;

        sqlx::query("DELETE FROM documents WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(conversation_id, count = count.0, "deleted conversation documents");
        Ok(u64::try_from(count.0).unwrap_or(0))
    }

    /// Total number of stored documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(row.0).unwrap_or(0))
    }

    /// Close the database pool. Idempotent.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

fn row_to_document(row: DocumentRow) -> Result<Document> {
    let (id, text, _vector, source, project_path, conversation_id, chunk_index, created_at, extra) =
        row;
    let metadata = DocumentMetadata {
        source,
        project_path,
        conversation_id,
        chunk_index,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
        extra: serde_json::from_str(&extra)?,
    };
    Ok(Document {
        id,
        text,
        metadata,
        embedding: None,
    })
}

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vector(blob: &[u8], dimension: usize) -> Result<Vec<f32>> {
    if blob.len() != dimension * 4 {
        return Err(StorageError::DimensionMismatch {
            expected: dimension,
            actual: blob.len() / 4,
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(dimension: usize) -> (tempfile::TempDir, VectorStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open(dir.path(), dimension).await.unwrap();
        (dir, store)
    }

    fn document(id: &str, source: &str, conversation_id: Option<&str>) -> Document {
        let mut meta = DocumentMetadata::new(source);
        meta.conversation_id = conversation_id.map(str::to_owned);
        let mut doc = Document::new(format!("text of {id}"), meta);
        doc.id = id.to_owned();
        doc
    }

    #[tokio::test]
    async fn add_and_get_round_trips() {
        let (_dir, store) = test_store(3).await;

        let mut doc = document("d1", "claude_code", Some("conv-1"));
        doc.metadata.project_path = Some("/proj".into());
        doc.metadata.chunk_index = 2;
        doc.metadata
            .extra
            .insert("lang".into(), serde_json::json!("rust"));

        store.add(&doc, &[1.0, 0.0, 0.0]).await.unwrap();

        let loaded = store.get("d1").await.unwrap().unwrap();
        assert_eq!(loaded.text, "text of d1");
        assert_eq!(loaded.metadata.conversation_id.as_deref(), Some("conv-1"));
        assert_eq!(loaded.metadata.chunk_index, 2);
        assert_eq!(
            loaded.metadata.extra.get("lang"),
            Some(&serde_json::json!("rust"))
        );
        assert!(loaded.embedding.is_none());
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (_dir, store) = test_store(3).await;
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_is_an_upsert() {
        let (_dir, store) = test_store(2).await;

        let mut doc = document("same", "claude_code", None);
        store.add(&doc, &[1.0, 0.0]).await.unwrap();

        doc.text = "revised".into();
        store.add(&doc, &[0.0, 1.0]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let loaded = store.get("same").await.unwrap().unwrap();
        assert_eq!(loaded.text, "revised");

        // Latest vector won: nearest to the second embedding.
        let results = store.search(&[0.0, 1.0], 1, None).await.unwrap();
        assert!(results[0].distance < f32::EPSILON);
    }

    #[tokio::test]
    async fn wrong_width_embedding_is_rejected() {
        let (_dir, store) = test_store(3).await;
        let doc = document("d", "claude_code", None);

        let err = store.add(&doc, &[1.0, 0.0]).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn batch_length_mismatch_is_a_usage_error() {
        let (_dir, store) = test_store(2).await;
        let docs = vec![document("a", "s", None), document("b", "s", None)];
        let embeddings = vec![vec![0.0, 1.0]];

        let err = store.add_batch(&docs, &embeddings).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::BatchLengthMismatch {
                documents: 2,
                embeddings: 1
            }
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_orders_by_ascending_distance() {
        let (_dir, store) = test_store(2).await;

        // Documents at distance 0.0, 0.1, 0.2, 0.3, 0.4 from the query.
        let query = [0.0_f32, 0.0];
        for i in 0..5 {
            let doc = document(&format!("d{i}"), "claude_code", None);
            #[allow(clippy::cast_precision_loss)]
            let x = 0.1 * i as f32;
            store.add(&doc, &[x, 0.0]).await.unwrap();
        }

        let results = store.search(&query, 3, None).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.document.id.clone()).collect();
        assert_eq!(ids, vec!["d0", "d1", "d2"]);

        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
            assert!(pair[0].score > pair[1].score);
        }
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let (_dir, store) = test_store(2).await;
        for i in 0..10 {
            let doc = document(&format!("d{i}"), "claude_code", None);
            store.add(&doc, &[0.0, 0.5]).await.unwrap();
        }
        let results = store.search(&[0.0, 0.0], 4, None).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn search_filters_before_ranking() {
        let (_dir, store) = test_store(2).await;

        // The nearest document has the wrong source.
        let near = document("near", "cursor", None);
        store.add(&near, &[0.0, 0.0]).await.unwrap();
        let far = document("far", "claude_code", None);
        store.add(&far, &[1.0, 1.0]).await.unwrap();

        let filter = DocumentFilter::source("claude_code");
        let results = store.search(&[0.0, 0.0], 10, Some(&filter)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "far");
    }

    #[tokio::test]
    async fn must_not_filter_excludes_and_passes_nulls() {
        let (_dir, store) = test_store(2).await;

        store
            .add(&document("a", "s", Some("conv-x")), &[0.0, 0.0])
            .await
            .unwrap();
        store
            .add(&document("b", "s", None), &[0.0, 0.1])
            .await
            .unwrap();

        let filter = DocumentFilter::default().and_not(
            FilterField::ConversationId,
            FieldValue::Text("conv-x".into()),
        );
        let results = store.search(&[0.0, 0.0], 10, Some(&filter)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "b");
    }

    #[tokio::test]
    async fn chunk_index_filter_matches_integers() {
        let (_dir, store) = test_store(2).await;

        let mut first = document("c0", "s", Some("conv"));
        first.metadata.chunk_index = 0;
        let mut second = document("c1", "s", Some("conv"));
        second.metadata.chunk_index = 1;
        store.add(&first, &[0.0, 0.0]).await.unwrap();
        store.add(&second, &[0.0, 0.0]).await.unwrap();

        let filter =
            DocumentFilter::conversation_id("conv").and(FilterField::ChunkIndex, FieldValue::Integer(1));
        let results = store.search(&[0.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "c1");
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let (_dir, store) = test_store(2).await;
        store
            .add(&document("d", "s", None), &[0.0, 0.0])
            .await
            .unwrap();

        assert!(store.delete("d").await.unwrap());
        assert!(!store.delete("d").await.unwrap());
        assert!(store.get("d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_conversation_counts_and_spares_others() {
        let (_dir, store) = test_store(2).await;

        let mut docs = Vec::new();
        let mut embeddings = Vec::new();
        for i in 0..5 {
            docs.push(document(&format!("a{i}"), "s", Some("A")));
            embeddings.push(vec![0.0, 0.1]);
        }
        docs.push(document("b0", "s", Some("B")));
        embeddings.push(vec![0.0, 0.2]);
        store.add_batch(&docs, &embeddings).await.unwrap();

        let deleted = store.delete_by_conversation("A").await.unwrap();
        assert_eq!(deleted, 5);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("b0").await.unwrap().is_some());

        // Nothing left to delete on a second pass.
        assert_eq!(store.delete_by_conversation("A").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reopen_with_same_dimension_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open(dir.path(), 2).await.unwrap();
            store
                .add(&document("kept", "s", None), &[0.3, 0.4])
                .await
                .unwrap();
            store.close().await;
        }

        let store = VectorStore::open(dir.path(), 2).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.search(&[0.3, 0.4], 1, None).await.unwrap();
        assert_eq!(results[0].document.id, "kept");
    }

    #[tokio::test]
    async fn reopen_with_different_dimension_fails() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = VectorStore::open(dir.path(), 2).await.unwrap();
            store.close().await;
        }

        let err = VectorStore::open(dir.path(), 3).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn wrong_width_query_is_rejected() {
        let (_dir, store) = test_store(3).await;
        let err = store.search(&[0.0, 0.0], 5, None).await.unwrap_err();
        assert!(matches!(err, StorageError::DimensionMismatch { .. }));
    }

    #[test]
    fn vector_blob_round_trips() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        let blob = encode_vector(&vector);
        assert_eq!(blob.len(), 12);
        assert_eq!(decode_vector(&blob, 3).unwrap(), vector);
    }

    #[test]
    fn l2_distance_basics() {
        assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < f32::EPSILON);
        assert!(l2_distance(&[1.0, 1.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_dir, store) = test_store(2).await;
        store.close().await;
        store.close().await;
    }
}
