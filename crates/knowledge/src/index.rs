//! In-memory vector index over document chunks.
//!
//! The only mutable shared resource in the system. Owned exclusively by
//! the session knowledge base and mutated only through `insert` and
//! `remove`; nothing here persists across the process lifetime.

use crate::text;
use crate::types::{Chunk, DocumentId};

/// One indexed chunk with its embedding.
///
/// The sequence number records insertion order and breaks similarity
/// ties deterministically (earlier insertion wins).
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    seq: u64,
}

/// In-memory cosine-similarity index.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    next_seq: u64,
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert chunks with their embeddings.
    ///
    /// Existing entries with the same chunk id are replaced, so
    /// re-ingesting a document is an upsert rather than a duplication.
    pub fn insert(&mut self, entries: Vec<(Chunk, Vec<f32>)>) {
        for (chunk, embedding) in entries {
            self.entries.retain(|e| e.chunk.id != chunk.id);
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.push(IndexEntry {
                chunk,
                embedding,
                seq,
            });
        }
    }

    /// Top-k nearest chunks by cosine similarity, descending.
    ///
    /// Ties are broken by insertion order. Asking for more entries than
    /// the index holds returns everything, sorted.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(Chunk, f32)> {
        let mut scored: Vec<(&IndexEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, cosine_similarity(query, &entry.embedding)))
            .collect();

        scored.sort_by(|(ea, sa), (eb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ea.seq.cmp(&eb.seq))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(entry, score)| (entry.chunk.clone(), score))
            .collect()
    }

    /// Top-k chunks by salient-term overlap with the query terms.
    ///
    /// The score is the fraction of query terms found in the chunk
    /// text. Complements vector search in hybrid retrieval, where exact
    /// identifiers (part numbers, error codes) matter more than
    /// semantic closeness. Ties are broken by insertion order.
    pub fn lexical_search(&self, query_terms: &[String], k: usize) -> Vec<(Chunk, f32)> {
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&IndexEntry, f32)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let haystack = text::normalize(&entry.chunk.text);
                let hits = query_terms
                    .iter()
                    .filter(|term| haystack.contains(term.as_str()))
                    .count();
                if hits == 0 {
                    None
                } else {
                    Some((entry, hits as f32 / query_terms.len() as f32))
                }
            })
            .collect();

        scored.sort_by(|(ea, sa), (eb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ea.seq.cmp(&eb.seq))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(entry, score)| (entry.chunk.clone(), score))
            .collect()
    }

    /// Remove every entry belonging to a document.
    ///
    /// Leaves the index as if the document had never been inserted.
    /// Returns the number of removed entries.
    pub fn remove(&mut self, document_id: &DocumentId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| &e.chunk.document_id != document_id);
        before - self.entries.len()
    }
}

/// Cosine similarity of two vectors.
///
/// Mismatched dimensions or zero-norm vectors score 0.0 rather than
/// poisoning the ranking with NaN.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
