use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::EmbedError;
use crate::provider::{BoxFuture, EmbeddingProvider};

/// Embedding provider backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    dimension: usize,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, dimension: usize) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            dimension,
        }
    }

    /// Check if Ollama is reachable.
    ///
    /// # Errors
    ///
    /// Returns a connection error if Ollama cannot be reached.
    pub async fn health_check(&self) -> Result<(), EmbedError> {
        self.client
            .list_local_models()
            .await
            .map_err(|e| EmbedError::Connection {
                provider: "ollama",
                detail: format!("is Ollama running? {e}"),
            })?;
        Ok(())
    }

    async fn request(&self, input: EmbeddingsInput) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = GenerateEmbeddingsRequest::new(self.model.clone(), input);

        let response =
            self.client
                .generate_embeddings(request)
                .await
                .map_err(|e| EmbedError::Connection {
                    provider: "ollama",
                    detail: e.to_string(),
                })?;

        Ok(response.embeddings)
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, EmbedError>> {
        let input = EmbeddingsInput::from(text);
        Box::pin(async move {
            self.request(input)
                .await?
                .into_iter()
                .next()
                .ok_or(EmbedError::EmptyResponse { provider: "ollama" })
        })
    }

    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>> {
        let input = EmbeddingsInput::Multiple(texts.to_vec());
        let expected = texts.len();
        Box::pin(async move {
            let vectors = self.request(input).await?;
            if vectors.len() != expected {
                return Err(EmbedError::EmptyResponse { provider: "ollama" });
            }
            Ok(vectors)
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn close(&self) -> BoxFuture<'_, Result<(), EmbedError>> {
        // ollama-rs holds no resources needing explicit teardown.
        Box::pin(async { Ok(()) })
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), 11434)
}
