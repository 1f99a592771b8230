//! Knowledge base configuration.
//!
//! All tuning parameters in one place, with serde defaults documented
//! as tunables rather than contracts: chunk sizing, retrieval depth and
//! floor, grounding strictness, and the collaborator deadline.

use serde::{Deserialize, Serialize};

/// Chunking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPolicy {
    /// Target upper bound on chunk size, in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Sliding-window overlap between consecutive chunks, in characters
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,

    /// Never split a table block, even past `max_chunk_chars`
    #[serde(default = "default_keep_tables_whole")]
    pub keep_tables_whole: bool,
}

fn default_max_chunk_chars() -> usize {
    2048
}

fn default_overlap_chars() -> usize {
    100
}

fn default_keep_tables_whole() -> bool {
    true
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
            keep_tables_whole: default_keep_tables_whole(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a chunk to count as evidence.
    /// Range: -1.0 to 1.0. Entries below the floor are dropped even if
    /// among the top-k.
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Fuse lexical keyword ranking with vector ranking (RRF)
    #[serde(default = "default_hybrid")]
    pub hybrid: bool,
}

fn default_top_k() -> usize {
    5
}

fn default_min_score() -> f32 {
    0.20
}

fn default_hybrid() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            hybrid: default_hybrid(),
        }
    }
}

/// What to do with answer segments that fail the support check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundingPolicy {
    /// Drop unsupported segments
    Strict,
    /// Keep unsupported segments but flag them
    Annotate,
}

/// Grounding verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingConfig {
    #[serde(default = "default_grounding_policy")]
    pub policy: GroundingPolicy,

    /// Minimum fraction of a segment's salient terms that must appear
    /// in a cited chunk for the citation to count as plausible support.
    /// A heuristic gate, not a proof: raising it trades missed support
    /// (false negatives) for fewer unsupported claims (false positives).
    #[serde(default = "default_support_threshold")]
    pub support_threshold: f32,
}

fn default_grounding_policy() -> GroundingPolicy {
    GroundingPolicy::Strict
}

fn default_support_threshold() -> f32 {
    0.30
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            policy: default_grounding_policy(),
            support_threshold: default_support_threshold(),
        }
    }
}

/// Answer synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Completion model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Low temperature keeps answers factual
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Cap on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Configuration for a session knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub chunking: ChunkPolicy,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub grounding: GroundingConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Deadline for any single collaborator call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkPolicy::default(),
            retrieval: RetrievalConfig::default(),
            grounding: GroundingConfig::default(),
            synthesis: SynthesisConfig::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
