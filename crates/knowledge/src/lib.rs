//! Grounded RAG core for technical-manual question answering.
//!
//! Turns uploaded manuals (parsed into page-tagged blocks) into an
//! in-memory queryable index and answers natural-language questions
//! with page-level citations. Every generated claim is checked against
//! the retrieved evidence before it reaches the user; unsupported
//! claims are dropped or flagged.
//!
//! Ingestion: parser → chunker → embedder → vector index.
//! Query: retriever → synthesizer → grounding verifier.
//!
//! External capabilities (PDF structuring, embedding, completion) are
//! injected behind traits, so the whole pipeline runs against
//! deterministic fakes in tests.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod parse;
pub mod retrieve;
pub mod session;
pub mod synthesize;
pub mod text;
pub mod types;
pub mod verify;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{
    ChunkPolicy, GroundingConfig, GroundingPolicy, KnowledgeConfig, RetrievalConfig,
    SynthesisConfig,
};
pub use session::SessionKnowledgeBase;
pub use types::{
    AnswerSegment, BlockKind, Chunk, ChunkId, Citation, ContentBlock, DocumentId, DocumentState,
    DocumentStatus, DraftAnswer, GroundedAnswer, PageRange, RetrievedEvidence, SegmentConfidence,
};
