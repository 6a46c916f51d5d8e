use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;
use crate::provider::{BoxFuture, EmbeddingProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.voyageai.com/v1";
pub const DEFAULT_MODEL: &str = "voyage-2";
pub const DEFAULT_DIMENSION: usize = 1024;

/// Embedding provider backed by the Voyage AI REST API.
///
/// The input is always sent as an array; Voyage has no single-text form.
pub struct VoyageProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

impl fmt::Debug for VoyageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoyageProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl VoyageProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.into(), DEFAULT_DIMENSION)
    }

    #[must_use]
    pub fn with_model(api_key: String, model: String, dimension: usize) -> Self {
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model,
            dimension,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, mut base_url: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let body = EmbeddingRequest {
            input,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(EmbedError::Http)?;

        if !status.is_success() {
            tracing::error!("Voyage embedding API error {status}: {text}");
            return Err(EmbedError::Other(format!(
                "Voyage embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;

        let mut data = resp.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingProvider for VoyageProvider {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, EmbedError>> {
        let input = vec![text.to_owned()];
        Box::pin(async move {
            self.request(&input)
                .await?
                .into_iter()
                .next()
                .ok_or(EmbedError::EmptyResponse { provider: "voyage" })
        })
    }

    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>> {
        let texts = texts.to_vec();
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let vectors = self.request(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(EmbedError::EmptyResponse { provider: "voyage" });
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
        Box::pin(async { Ok(()) })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
