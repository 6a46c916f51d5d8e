use std::future::Future;
use std::pin::Pin;

use crate::error::EmbedError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Contract every embedding backend implements.
///
/// Providers hold network resources; callers must invoke `close` when done,
/// or go through [`with_provider`] which guarantees it on every exit path.
pub trait EmbeddingProvider: std::fmt::Debug + Send + Sync {
    /// Generate an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails or the provider is unreachable.
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, EmbedError>>;

    /// Generate embeddings for multiple texts, one vector per input.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails or the provider is unreachable.
    fn embed_batch(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>>;

    /// Width of the vectors this provider produces. Vector storage must be
    /// configured with the same dimension.
    fn dimension(&self) -> usize;

    /// Identifying name of the underlying model.
    fn model_name(&self) -> &str;

    /// Release held resources. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails.
    fn close(&self) -> BoxFuture<'_, Result<(), EmbedError>>;
}

/// Run `f` with the provider, then close it regardless of the outcome.
///
/// The usage error wins over a close error; a close failure after a
/// successful `f` is surfaced as the call's error.
///
/// # Errors
///
/// Returns the error from `f`, or from `close` when `f` succeeded.
pub async fn with_provider<T, F>(
    provider: Box<dyn EmbeddingProvider>,
    f: F,
) -> Result<T, EmbedError>
where
    F: for<'a> FnOnce(&'a dyn EmbeddingProvider) -> BoxFuture<'a, Result<T, EmbedError>>,
{
    let result = f(provider.as_ref()).await;
    let closed = provider.close().await;

    match result {
        Ok(value) => {
            closed?;
            Ok(value)
        }
        Err(e) => {
            if let Err(close_err) = closed {
                tracing::warn!("provider close failed after usage error: {close_err}");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Debug)]
    struct StubProvider {
        close_calls: Arc<AtomicUsize>,
        fail_embed: bool,
    }

    impl EmbeddingProvider for StubProvider {
        fn embed(&self, _text: &str) -> BoxFuture<'_, Result<Vec<f32>, EmbedError>> {
            let fail = self.fail_embed;
            Box::pin(async move {
                if fail {
                    Err(EmbedError::Unavailable { provider: "stub" })
                } else {
                    Ok(vec![0.1, 0.2, 0.3])
                }
            })
        }

        fn embed_batch(
            &self,
            texts: &[String],
        ) -> BoxFuture<'_, Result<Vec<Vec<f32>>, EmbedError>> {
            let n = texts.len();
            Box::pin(async move { Ok(vec![vec![0.0; 3]; n]) })
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }

        fn close(&self) -> BoxFuture<'_, Result<(), EmbedError>> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn with_provider_closes_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(StubProvider {
            close_calls: Arc::clone(&calls),
            fail_embed: false,
        });

        let embedding = with_provider(provider, |p| Box::pin(async move { p.embed("hello").await }))
            .await
            .unwrap();

        assert_eq!(embedding.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_provider_closes_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Box::new(StubProvider {
            close_calls: Arc::clone(&calls),
            fail_embed: true,
        });

        let result =
            with_provider(provider, |p| Box::pin(async move { p.embed("hello").await })).await;

        assert!(matches!(result, Err(EmbedError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batch_returns_one_vector_per_input() {
        let provider = StubProvider {
            close_calls: Arc::new(AtomicUsize::new(0)),
            fail_embed: false,
        };
        let texts = vec!["a".to_owned(), "b".to_owned()];
        let vectors = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
    }
}
