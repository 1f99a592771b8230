//! Evidence retrieval for the query path.
//!
//! Embeds the (synonym-expanded) question, ranks indexed chunks by
//! cosine similarity, and optionally fuses in a lexical keyword ranking
//! via reciprocal rank fusion. A minimum-similarity floor decides which
//! chunks are eligible as evidence at all; returning no evidence is a
//! normal outcome, not an error.

use crate::config::RetrievalConfig;
use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::text::{self, SynonymTable};
use crate::types::{Chunk, ChunkId, RetrievedEvidence};
use manualqa_core::AppResult;
use std::collections::HashMap;
use std::time::Duration;

/// RRF rank constant; dampens the weight difference between adjacent
/// ranks. 60 is the conventional value.
const RRF_K: f32 = 60.0;

/// Query-path retriever.
pub struct Retriever {
    config: RetrievalConfig,
    synonyms: SynonymTable,
}

impl Retriever {
    /// Create a retriever with the technical-manual synonym defaults.
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            synonyms: SynonymTable::technical_defaults(),
        }
    }

    /// Replace the synonym table.
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Expand and embed a question under a deadline.
    ///
    /// Split out from ranking so callers can embed before taking the
    /// index lock; ranking itself never suspends.
    pub async fn embed_query(
        &self,
        embedder: &dyn EmbeddingProvider,
        question: &str,
        timeout: Duration,
    ) -> AppResult<(String, Vec<f32>)> {
        let expanded = self.synonyms.expand(question);
        tracing::debug!("Expanded query: {}", expanded);

        let vector = embed_with_timeout(embedder, &expanded, timeout).await?;
        Ok((expanded, vector))
    }

    /// Rank indexed chunks against an embedded query.
    ///
    /// Pure and synchronous. The similarity floor applies to cosine
    /// scores; in hybrid mode the lexical ranking reorders and promotes
    /// floor-passing chunks but never readmits one below the floor.
    pub fn rank(
        &self,
        index: &VectorIndex,
        query_vector: &[f32],
        expanded_query: &str,
    ) -> Vec<RetrievedEvidence> {
        if index.is_empty() {
            return Vec::new();
        }

        // Score every chunk so floor filtering sees the full ranking,
        // not just the top-k.
        let scored = index.search(query_vector, index.len());

        let eligible: Vec<(Chunk, f32)> = scored
            .into_iter()
            .filter(|(_, score)| *score >= self.config.min_score)
            .collect();

        if eligible.is_empty() {
            tracing::info!(
                "No relevant chunks found (all scores below {:.2} threshold)",
                self.config.min_score
            );
            return Vec::new();
        }

        let selected = if self.config.hybrid {
            self.fuse(index, eligible, expanded_query)
        } else {
            eligible
        };

        let evidence: Vec<RetrievedEvidence> = selected
            .into_iter()
            .take(self.config.top_k)
            .map(|(chunk, score)| RetrievedEvidence { chunk, score })
            .collect();

        if let Some(top) = evidence.first() {
            let scores: Vec<f32> = evidence.iter().map(|e| e.score).collect();
            tracing::info!(
                "Retrieved {} relevant chunks (top score: {:.3})",
                evidence.len(),
                top.score
            );
            tracing::debug!("Evidence scores: {:?}", scores);
        }

        evidence
    }

    /// Reciprocal rank fusion of the cosine ranking with a lexical
    /// keyword ranking over the eligible chunks.
    fn fuse(
        &self,
        index: &VectorIndex,
        eligible: Vec<(Chunk, f32)>,
        expanded_query: &str,
    ) -> Vec<(Chunk, f32)> {
        let terms = text::salient_terms(expanded_query);
        if terms.is_empty() {
            return eligible;
        }

        let eligible_ids: HashMap<ChunkId, usize> = eligible
            .iter()
            .enumerate()
            .map(|(rank, (chunk, _))| (chunk.id.clone(), rank))
            .collect();

        let lexical = index.lexical_search(&terms, index.len());

        let mut fused: HashMap<ChunkId, f32> = HashMap::new();
        for (rank, (chunk, _)) in eligible.iter().enumerate() {
            *fused.entry(chunk.id.clone()).or_default() += 1.0 / (RRF_K + rank as f32 + 1.0);
        }
        for (rank, (chunk, _)) in lexical.iter().enumerate() {
            // Lexical hits below the similarity floor stay excluded.
            if eligible_ids.contains_key(&chunk.id) {
                *fused.entry(chunk.id.clone()).or_default() += 1.0 / (RRF_K + rank as f32 + 1.0);
            }
        }

        let mut selected = eligible;
        selected.sort_by(|(ca, sa), (cb, sb)| {
            let fa = fused.get(&ca.id).copied().unwrap_or(0.0);
            let fb = fused.get(&cb.id).copied().unwrap_or(0.0);
            fb.partial_cmp(&fa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(sb.partial_cmp(sa).unwrap_or(std::cmp::Ordering::Equal))
                .then(ca.document_id.as_str().cmp(cb.document_id.as_str()))
                .then(ca.position.cmp(&cb.position))
        });
        selected
    }

    /// Retrieve evidence for a question in one call.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        embedder: &dyn EmbeddingProvider,
        question: &str,
        timeout: Duration,
    ) -> AppResult<Vec<RetrievedEvidence>> {
        let (expanded, vector) = self.embed_query(embedder, question, timeout).await?;
        Ok(self.rank(index, &vector, &expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;
    use crate::types::{ChunkId, DocumentId, PageRange};

    fn doc() -> DocumentId {
        DocumentId::derive("manual.pdf", b"bytes")
    }

    fn chunk(position: u32, text: &str) -> Chunk {
        let d = doc();
        Chunk {
            id: ChunkId::derive(&d, position as usize * 1000),
            document_id: d,
            position,
            text: text.to_string(),
            pages: PageRange::single(position + 1),
        }
    }

    fn retriever(min_score: f32, hybrid: bool) -> Retriever {
        Retriever::new(RetrievalConfig {
            top_k: 5,
            min_score,
            hybrid,
        })
        .with_synonyms(SynonymTable::new())
    }

    #[test]
    fn test_rank_applies_similarity_floor() {
        let mut index = VectorIndex::new();
        index.insert(vec![
            (chunk(0, "close match"), vec![1.0, 0.0]),
            (chunk(1, "weak match"), vec![0.1, 1.0]),
        ]);

        let evidence = retriever(0.5, false).rank(&index, &[1.0, 0.0], "");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].chunk.position, 0);
    }

    #[test]
    fn test_rank_empty_when_all_below_floor() {
        let mut index = VectorIndex::new();
        index.insert(vec![(chunk(0, "anything"), vec![0.0, 1.0])]);

        let evidence = retriever(0.9, false).rank(&index, &[1.0, 0.0], "");
        assert!(evidence.is_empty());
    }

    #[test]
    fn test_hybrid_promotes_keyword_match() {
        let mut index = VectorIndex::new();
        // Both pass the floor; the second ranks lower on cosine but
        // contains the query's exact term.
        index.insert(vec![
            (chunk(0, "general maintenance overview"), vec![1.0, 0.0]),
            (
                chunk(1, "tightening torque for the drain bolt"),
                vec![0.95, 0.3],
            ),
        ]);

        let evidence = retriever(0.1, true).rank(&index, &[1.0, 0.0], "torque bolt");
        assert_eq!(evidence[0].chunk.position, 1);
    }

    #[test]
    fn test_hybrid_does_not_readmit_below_floor() {
        let mut index = VectorIndex::new();
        index.insert(vec![
            (chunk(0, "general overview"), vec![1.0, 0.0]),
            (chunk(1, "exact torque keyword"), vec![-1.0, 0.0]),
        ]);

        let evidence = retriever(0.2, true).rank(&index, &[1.0, 0.0], "torque");
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].chunk.position, 0);
    }

    #[tokio::test]
    async fn test_retrieve_end_to_end_with_mock_embedder() {
        let provider = MockProvider::new(128);
        let mut index = VectorIndex::new();

        let torque_text = "Tightening torque specification: 45 Nm for the cylinder head";
        let torque_vec = provider.embed(torque_text).await.unwrap();
        let other_text = "Warranty and service intervals";
        let other_vec = provider.embed(other_text).await.unwrap();

        index.insert(vec![
            (chunk(0, torque_text), torque_vec),
            (chunk(1, other_text), other_vec),
        ]);

        let retriever = Retriever::new(RetrievalConfig {
            top_k: 2,
            min_score: 0.05,
            hybrid: true,
        });
        let evidence = retriever
            .retrieve(
                &index,
                &provider,
                "What is the torque specification?",
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert!(!evidence.is_empty());
        assert_eq!(evidence[0].chunk.position, 0);
    }

    #[tokio::test]
    async fn test_retrieve_empty_index_is_no_evidence() {
        let provider = MockProvider::new(64);
        let index = VectorIndex::new();
        let retriever = retriever(0.2, true);

        let evidence = retriever
            .retrieve(&index, &provider, "anything", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(evidence.is_empty());
    }
}
