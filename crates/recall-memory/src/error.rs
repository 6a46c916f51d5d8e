#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("conversation not found: {id}")]
    ConversationNotFound { id: String },

    #[error("document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("batch length mismatch: {documents} documents, {embeddings} embeddings")]
    BatchLengthMismatch { documents: usize, embeddings: usize },
}

pub type Result<T> = std::result::Result<T, StorageError>;
