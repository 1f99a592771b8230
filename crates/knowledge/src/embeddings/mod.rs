//! Embedding gateway for the knowledge base.
//!
//! Provider-agnostic embedding generation, plus deadline enforcement
//! for the external calls so ingestion and queries never hang on a
//! slow embedding runtime.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use manualqa_core::{AppError, AppResult};
use std::time::Duration;

/// Embed a batch of texts under a deadline.
///
/// Expiry surfaces as `CollaboratorTimeout` rather than hanging the
/// ingestion pipeline.
pub async fn embed_batch_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    timeout: Duration,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(
        "Embedding {} texts with provider '{}' (model: {})",
        texts.len(),
        provider.provider_name(),
        provider.model_name()
    );

    match tokio::time::timeout(timeout, provider.embed_batch(texts)).await {
        Ok(result) => {
            let embeddings = result?;
            if embeddings.len() != texts.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} embeddings for {} texts",
                    embeddings.len(),
                    texts.len()
                )));
            }
            Ok(embeddings)
        }
        Err(_) => Err(AppError::timeout("embedder", timeout.as_secs())),
    }
}

/// Embed a single text under a deadline.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> AppResult<Vec<f32>> {
    let mut results = embed_batch_with_timeout(provider, &[text.to_string()], timeout).await?;
    results
        .pop()
        .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
}
