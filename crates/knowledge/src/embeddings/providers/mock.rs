//! Mock embedding provider using trigram-based content-aware embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use crate::text;
use manualqa_core::{AppError, AppResult};
use std::collections::HashMap;
use std::time::Duration;

/// Mock provider for testing and development.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like a real model, but
/// consistent and content-dependent, which is what tests need.
pub struct MockProvider {
    dimensions: usize,
    delay: Option<Duration>,
    fail: bool,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            delay: None,
            fail: false,
        }
    }

    /// Create a mock that fails every embedding call.
    pub fn failing(dimensions: usize) -> Self {
        Self {
            dimensions,
            delay: None,
            fail: true,
        }
    }

    /// Sleep for `delay` before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Generate a mock embedding for text using trigram hashing.
    fn generate_mock_embedding(&self, input: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let words = text::salient_terms(input);

        let mut word_freq = HashMap::new();
        for word in &words {
            *word_freq.entry(word.as_str()).or_insert(0u32) += 1;
        }

        // Map each unique word to multiple dimensions via character
        // trigrams, plus one dimension for the whole word.
        for (word, freq) in word_freq.iter() {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(AppError::Embedding("mock embedding failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| self.generate_mock_embedding(text))
            .collect())
    }
}
