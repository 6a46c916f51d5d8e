//! Conversation persistence with a SQLite metadata index, sharded JSON
//! content files, and a SQLite-resident embedding table.

pub mod conversation;
pub mod error;
pub mod models;
pub mod vector;

pub use conversation::ConversationStore;
pub use error::StorageError;
pub use models::{
    Conversation, ConversationStats, Document, DocumentMetadata, Message, SearchResult,
};
pub use vector::{DocumentFilter, FieldCondition, FieldValue, FilterField, VectorStore};
