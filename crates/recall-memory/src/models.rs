//! Value types shared by the conversation and vector stores.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open-ended metadata mapping carried by several record types.
pub type ExtraMap = HashMap<String, serde_json::Value>;

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Conventionally "user" or "assistant", but free-form.
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ExtraMap>,
}

impl Message {
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: None,
            tool_calls: Vec::new(),
        }
    }
}

/// A full conversation with messages and metadata.
///
/// Message order is conversation order and is preserved verbatim across
/// save/load. `updated_at` never precedes `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Null until the conversation has been vectorized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "ExtraMap::is_empty")]
    pub extra: ExtraMap,
}

impl Conversation {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            project_path: None,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            indexed_at: None,
            title: None,
            extra: ExtraMap::new(),
        }
    }
}

/// Metadata for a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Origin of the document (e.g. "claude_code").
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    /// Back-reference to the parent conversation, not an ownership edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Position within a chunked parent document.
    #[serde(default)]
    pub chunk_index: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "ExtraMap::is_empty")]
    pub extra: ExtraMap,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            project_path: None,
            conversation_id: None,
            chunk_index: 0,
            created_at: Utc::now(),
            extra: ExtraMap::new(),
        }
    }
}

/// A document stored in the vector store.
///
/// The embedding rides along in memory only; the persisted form lives in
/// the vector table row, never on the serialized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    #[must_use]
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metadata,
            embedding: None,
        }
    }
}

/// Result from a vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub document: Document,
    /// Similarity score, higher is better; always in (0, 1] for
    /// non-negative distances.
    pub score: f32,
    /// Raw distance from the query vector, lower is closer.
    pub distance: f32,
}

impl SearchResult {
    /// Build a result from a raw distance, deriving `score = 1/(1+distance)`.
    #[must_use]
    pub fn from_distance(document: Document, distance: f32) -> Self {
        Self {
            document,
            score: 1.0 / (1.0 + distance),
            distance,
        }
    }
}

/// Aggregate counts reported by [`crate::ConversationStore::get_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationStats {
    pub total: i64,
    pub indexed: i64,
    pub unique_projects: i64,
}
