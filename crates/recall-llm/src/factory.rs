use recall_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use recall_core::error::ConfigError;

use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::EmbeddingProvider;
use crate::voyage::VoyageProvider;

/// Build the embedding provider selected by configuration.
///
/// Validates per-variant credentials up front so misconfiguration fails at
/// startup, not on the first embedding call.
///
/// # Errors
///
/// Returns `ConfigError::MissingApiKey` when the selected remote provider
/// has no API key configured.
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>, ConfigError> {
    match config.provider {
        EmbeddingProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(
            &config.ollama_base_url,
            config.ollama_model.clone(),
            config.dimension,
        ))),
        EmbeddingProviderKind::Voyage => {
            let key = config
                .voyage_api_key
                .clone()
                .ok_or(ConfigError::MissingApiKey {
                    provider: "voyage",
                    key: "voyage_api_key",
                })?;
            Ok(Box::new(VoyageProvider::new(key)))
        }
        EmbeddingProviderKind::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or(ConfigError::MissingApiKey {
                    provider: "openai",
                    key: "openai_api_key",
                })?;
            Ok(Box::new(OpenAiProvider::new(key)))
        }
    }
}
