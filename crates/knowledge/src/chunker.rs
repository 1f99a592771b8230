//! Block-to-chunk splitting with page-aware boundaries.
//!
//! Accumulates parsed blocks into retrieval-sized chunks under a
//! configurable policy. Chunk boundaries never cross a page, tables are
//! kept whole by default, and consecutive chunks share a character
//! overlap so context is not lost at a boundary. Chunk ids are a
//! deterministic function of the document id and the chunk's offset, so
//! re-ingesting the same document reproduces the same ids.

use crate::config::ChunkPolicy;
use crate::types::{BlockKind, Chunk, ChunkId, ContentBlock, DocumentId, PageRange};

/// Split a document's block sequence into chunks.
///
/// An empty block sequence yields an empty chunk sequence.
pub fn split(document_id: &DocumentId, blocks: &[ContentBlock], policy: &ChunkPolicy) -> Vec<Chunk> {
    let mut splitter = Splitter::new(document_id, policy);

    let mut i = 0;
    while i < blocks.len() {
        let page = blocks[i].page;
        let mut j = i;
        while j < blocks.len() && blocks[j].page == page {
            j += 1;
        }
        splitter.split_page(page, &blocks[i..j]);
        i = j;
    }

    let chunks = splitter.finish();
    tracing::debug!(
        "Chunked {} blocks into {} chunks (max: {}, overlap: {})",
        blocks.len(),
        chunks.len(),
        policy.max_chunk_chars,
        policy.overlap_chars
    );
    chunks
}

/// Separator between blocks accumulated into one chunk.
const BLOCK_SEPARATOR: &str = "\n\n";

struct Splitter<'a> {
    document_id: &'a DocumentId,
    max_chars: usize,
    overlap_chars: usize,
    keep_tables_whole: bool,
    chunks: Vec<Chunk>,
    position: u32,
    /// Virtual offset of the next chunk start; strictly increasing,
    /// feeds the deterministic chunk id.
    cursor: usize,
}

impl<'a> Splitter<'a> {
    fn new(document_id: &'a DocumentId, policy: &ChunkPolicy) -> Self {
        let max_chars = policy.max_chunk_chars.max(1);
        // Overlap must leave room for the chunk to advance.
        let overlap_chars = policy.overlap_chars.min(max_chars / 2);
        Self {
            document_id,
            max_chars,
            overlap_chars,
            keep_tables_whole: policy.keep_tables_whole,
            chunks: Vec::new(),
            position: 0,
            cursor: 0,
        }
    }

    fn split_page(&mut self, page: u32, blocks: &[ContentBlock]) {
        let mut buffer = String::new();
        // Length of the overlap seed at the head of the buffer; a
        // buffer holding nothing but its seed is never re-emitted.
        let mut seed_len = 0usize;

        for block in blocks {
            let text = block.text.trim();
            if text.is_empty() {
                continue;
            }

            if block.kind == BlockKind::Table && self.keep_tables_whole {
                if buffer.len() > seed_len {
                    self.flush(&mut buffer, page, false);
                } else {
                    buffer.clear();
                }
                seed_len = 0;
                self.emit_with_carry(text.to_string(), page, 0);
                continue;
            }

            if text.len() > self.max_chars {
                // A single oversized block: fold pending context in and
                // hard-split at char-boundary-safe limits.
                let seed = if buffer.len() > seed_len {
                    std::mem::take(&mut buffer)
                } else {
                    buffer.clear();
                    String::new()
                };
                buffer = self.hard_split(text, page, seed);
                seed_len = 0;
                continue;
            }

            if !buffer.is_empty()
                && buffer.len() + BLOCK_SEPARATOR.len() + text.len() > self.max_chars
            {
                if buffer.len() > seed_len {
                    self.flush(&mut buffer, page, true);
                } else {
                    buffer.clear();
                }
                seed_len = buffer.len();
            }

            if !buffer.is_empty() {
                buffer.push_str(BLOCK_SEPARATOR);
            }
            buffer.push_str(text);
        }

        if buffer.len() > seed_len {
            self.flush(&mut buffer, page, false);
        }
    }

    /// Emit the buffer as a chunk. With `carry_overlap`, the buffer is
    /// reseeded with the emitted chunk's trailing characters.
    fn flush(&mut self, buffer: &mut String, page: u32, carry_overlap: bool) {
        if buffer.trim().is_empty() {
            buffer.clear();
            return;
        }

        let text = std::mem::take(buffer);
        let tail = if carry_overlap {
            overlap_tail(&text, self.overlap_chars)
        } else {
            String::new()
        };

        self.emit_with_carry(text, page, tail.len());
        *buffer = tail;
    }

    /// Hard-split an oversized block; the final short remainder becomes
    /// the new buffer so following blocks can still join it.
    fn hard_split(&mut self, text: &str, page: u32, seed: String) -> String {
        let mut remaining = if seed.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", seed, BLOCK_SEPARATOR, text)
        };

        while remaining.len() > self.max_chars {
            let mut end = self.max_chars;
            while end > 0 && !remaining.is_char_boundary(end) {
                end -= 1;
            }
            let piece: String = remaining[..end].to_string();
            let rest: String = remaining[end..].to_string();
            self.emit_with_carry(piece, page, 0);
            remaining = rest;
        }
        remaining
    }

    fn emit_with_carry(&mut self, text: String, page: u32, carry_len: usize) {
        let advance = text.len().saturating_sub(carry_len).max(1);
        let chunk = Chunk {
            id: ChunkId::derive(self.document_id, self.cursor),
            document_id: self.document_id.clone(),
            position: self.position,
            text,
            pages: PageRange::single(page),
        };
        self.chunks.push(chunk);
        self.position += 1;
        self.cursor += advance;
    }

    fn finish(self) -> Vec<Chunk> {
        self.chunks
    }
}

/// Last `overlap` characters of `text`, respecting UTF-8 boundaries and
/// never swallowing the whole chunk.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 || text.len() <= overlap {
        return String::new();
    }
    let mut start = text.len() - overlap;
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
