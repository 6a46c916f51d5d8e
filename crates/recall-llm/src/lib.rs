//! Embedding provider abstraction and backend implementations.

pub mod error;
pub mod factory;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod voyage;

pub use error::EmbedError;
pub use factory::create_embedding_provider;
pub use provider::{EmbeddingProvider, with_provider};
