use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Ollama,
    Voyage,
    OpenAi,
}

impl FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ollama" => Ok(Self::Ollama),
            "voyage" => Ok(Self::Voyage),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnknownProvider(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub ollama_model: String,
    pub ollama_base_url: String,
    /// Vector width produced by the configured model. Must match the
    /// dimension the vector store was created with.
    pub dimension: usize,
    pub voyage_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Ollama,
            ollama_model: "nomic-embed-text".into(),
            ollama_base_url: "http://localhost:11434".into(),
            dimension: 768,
            voyage_api_key: None,
            openai_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for the conversation index and content files.
    pub data_dir: PathBuf,
    /// Directory holding the vector store.
    pub vector_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = home_dir().join(".recall");
        let vector_dir = data_dir.join("vectors");
        Self {
            data_dir,
            vector_dir,
        }
    }
}

/// Process configuration, constructed once at startup and passed by
/// reference into every component that needs it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if an env override names an unknown provider.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Build a fresh configuration rooted at `dir`, for tests.
    ///
    /// Touches no global state: no file reads, no env lookups.
    #[must_use]
    pub fn for_tests(dir: &Path) -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            storage: StorageConfig {
                data_dir: dir.join("data"),
                vector_dir: dir.join("vectors"),
            },
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("RECALL_EMBEDDING_PROVIDER") {
            self.embedding.provider = v.parse()?;
        }
        if let Ok(v) = std::env::var("RECALL_OLLAMA_MODEL") {
            self.embedding.ollama_model = v;
        }
        if let Ok(v) = std::env::var("RECALL_OLLAMA_BASE_URL") {
            self.embedding.ollama_base_url = v;
        }
        if let Ok(v) = std::env::var("RECALL_VOYAGE_API_KEY") {
            self.embedding.voyage_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("RECALL_OPENAI_API_KEY") {
            self.embedding.openai_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("RECALL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(&v);
            self.storage.vector_dir = PathBuf::from(v).join("vectors");
        }
        Ok(())
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
