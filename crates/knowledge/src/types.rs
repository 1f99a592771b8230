//! Knowledge system type definitions.
//!
//! Value types shared across the ingestion and query paths: documents,
//! parsed content blocks, chunks, retrieved evidence, and the grounded
//! answers handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable document identifier.
///
/// Derived from the document name and raw bytes, so re-uploading the
/// same file yields the same id (and, downstream, the same chunk ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derive an id from a document's name and raw content.
    pub fn derive(name: &str, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(bytes);
        let digest = hasher.finalize();
        Self(hex_prefix(&digest, 16))
    }

    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable chunk identifier.
///
/// A deterministic function of the owning document id and the chunk's
/// character offset within the parsed document text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(String);

impl ChunkId {
    /// Derive an id from the owning document and the chunk offset.
    pub fn derive(document_id: &DocumentId, offset: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document_id.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(offset.to_string().as_bytes());
        let digest = hasher.finalize();
        Self(hex_prefix(&digest, 16))
    }

    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hex_prefix(digest: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in digest {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{:02x}", byte));
    }
    out.truncate(chars);
    out
}

/// Lifecycle state of an ingested document.
///
/// Transitions are strictly sequential: `Uploaded → Parsed → Chunked →
/// Indexed`, with `Failed` reachable from any state. Failed documents
/// are never resumed; they must be re-ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentState {
    Uploaded,
    Parsed,
    Chunked,
    Indexed,
    Failed(String),
}

impl DocumentState {
    /// Whether the document participates in query answering.
    pub fn is_queryable(&self) -> bool {
        matches!(self, DocumentState::Indexed)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Uploaded => f.write_str("uploaded"),
            DocumentState::Parsed => f.write_str("parsed"),
            DocumentState::Chunked => f.write_str("chunked"),
            DocumentState::Indexed => f.write_str("indexed"),
            DocumentState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Status row returned by `list_documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub id: DocumentId,
    pub name: String,
    pub ingested_at: DateTime<Utc>,
    pub state: DocumentState,
}

/// Kind of parsed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Table,
}

/// Unit of parser output: a page-tagged span of document content.
///
/// Tables are serialized to Markdown rows so row/column association
/// survives retrieval. Page numbers are 1-based and non-decreasing
/// across a document's block sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub page: u32,
    pub text: String,
}

/// Inclusive page range with human-readable formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// A range covering a single page.
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    /// Extend the range to include another page.
    pub fn extend_to(&mut self, page: u32) {
        if page < self.start {
            self.start = page;
        }
        if page > self.end {
            self.end = page;
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "p. {}", self.start)
        } else {
            write!(f, "pp. {}-{}", self.start, self.end)
        }
    }
}

/// A retrieval-sized span of document text with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier (document id + offset)
    pub id: ChunkId,

    /// Owning document
    pub document_id: DocumentId,

    /// Chunk position in document (0-indexed)
    pub position: u32,

    /// Text content
    pub text: String,

    /// Source page range
    pub pages: PageRange,
}

/// A chunk surfaced for one query, with its similarity score.
///
/// A read-only view valid for the lifetime of a single query; nothing
/// here is owned by the index.
#[derive(Debug, Clone)]
pub struct RetrievedEvidence {
    pub chunk: Chunk,
    pub score: f32,
}

/// Provenance attached to an answer segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: DocumentId,
    pub chunk_id: ChunkId,
    pub pages: PageRange,
}

impl Citation {
    /// Build a citation pointing at a retrieved chunk.
    pub fn for_chunk(chunk: &Chunk) -> Self {
        Self {
            document_id: chunk.document_id.clone(),
            chunk_id: chunk.id.clone(),
            pages: chunk.pages,
        }
    }
}

/// Per-segment groundedness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentConfidence {
    /// At least one cited chunk plausibly supports the segment
    Supported,
    /// Kept under the annotate policy despite failing verification
    Flagged,
}

/// One verified sentence of the final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSegment {
    pub text: String,
    pub confidence: SegmentConfidence,
    pub citations: Vec<Citation>,
}

/// The final, verified answer handed to the presentation layer.
///
/// Constructed fresh per query and never mutated afterwards. When no
/// segment survives verification the fixed insufficient-information
/// answer is returned instead of empty text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    /// Assembled answer text
    pub text: String,

    /// Surviving segments in original order
    pub segments: Vec<AnswerSegment>,

    /// Deduplicated citations across all segments
    pub citations: Vec<Citation>,

    /// Fraction of draft segments that passed verification
    pub groundedness: f32,
}

/// Fixed fallback shown whenever nothing grounded can be said.
pub const INSUFFICIENT_EVIDENCE_ANSWER: &str =
    "The uploaded documents do not contain enough grounded information to answer this question.";

impl GroundedAnswer {
    /// The fixed insufficient-information fallback.
    pub fn insufficient() -> Self {
        Self {
            text: INSUFFICIENT_EVIDENCE_ANSWER.to_string(),
            segments: Vec::new(),
            citations: Vec::new(),
            groundedness: 0.0,
        }
    }

    /// Whether this is the fallback rather than a grounded answer.
    pub fn is_fallback(&self) -> bool {
        self.segments.is_empty()
    }
}

/// One sentence of the raw model draft with its parsed citation markers.
#[derive(Debug, Clone)]
pub struct DraftSegment {
    /// Sentence text with citation markers stripped
    pub text: String,

    /// 0-based evidence indices parsed from `[n]` markers
    pub citations: Vec<usize>,

    /// False when the sentence carried no valid marker
    pub supported: bool,
}

/// Draft answer produced by the synthesizer, before verification.
#[derive(Debug, Clone)]
pub struct DraftAnswer {
    /// Raw model output
    pub raw: String,

    /// Parsed sentences; empty for the no-evidence short-circuit
    pub segments: Vec<DraftSegment>,
}

/// Fixed draft text used when retrieval produced no evidence.
pub const NO_EVIDENCE_DRAFT: &str =
    "No supporting passages were found in the uploaded documents for this question.";

impl DraftAnswer {
    /// The fixed draft returned without any model call when retrieval
    /// produced no evidence. Generating from zero evidence is the
    /// primary hallucination risk, so this short-circuit is mandatory.
    pub fn no_evidence() -> Self {
        Self {
            raw: NO_EVIDENCE_DRAFT.to_string(),
            segments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_deterministic() {
        let a = DocumentId::derive("manual.pdf", b"content");
        let b = DocumentId::derive("manual.pdf", b"content");
        let c = DocumentId::derive("manual.pdf", b"other content");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn test_chunk_id_depends_on_offset() {
        let doc = DocumentId::derive("manual.pdf", b"content");
        let a = ChunkId::derive(&doc, 0);
        let b = ChunkId::derive(&doc, 2048);

        assert_ne!(a, b);
        assert_eq!(a, ChunkId::derive(&doc, 0));
    }

    #[test]
    fn test_page_range_display() {
        assert_eq!(PageRange::single(3).to_string(), "p. 3");

        let mut range = PageRange::single(3);
        range.extend_to(5);
        assert_eq!(range.to_string(), "pp. 3-5");
    }

    #[test]
    fn test_state_queryable() {
        assert!(DocumentState::Indexed.is_queryable());
        assert!(!DocumentState::Uploaded.is_queryable());
        assert!(!DocumentState::Failed("parse error".into()).is_queryable());
    }

    #[test]
    fn test_insufficient_answer_is_fallback() {
        let answer = GroundedAnswer::insufficient();
        assert!(answer.is_fallback());
        assert!(!answer.text.is_empty());
        assert_eq!(answer.groundedness, 0.0);
    }
}
