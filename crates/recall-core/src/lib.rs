//! Configuration for the recall storage core.

pub mod config;
pub mod error;

pub use config::{Config, EmbeddingConfig, EmbeddingProviderKind, StorageConfig};
pub use error::ConfigError;
