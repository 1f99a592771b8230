//! Grounding verification (hallucination guard).
//!
//! Checks every draft segment against the evidence it claims to cite.
//! The support check is a deterministic lexical gate: a cited chunk
//! counts as plausible support when it contains at least a configured
//! fraction of the segment's salient terms. A heuristic, not a proof —
//! the threshold trades false positives against false negatives and is
//! exposed in [`GroundingConfig`].

use crate::config::{GroundingConfig, GroundingPolicy};
use crate::text;
use crate::types::{
    AnswerSegment, Citation, DraftAnswer, GroundedAnswer, RetrievedEvidence, SegmentConfidence,
};
use std::collections::HashSet;

/// Verifies draft answers against retrieved evidence.
pub struct GroundingVerifier {
    config: GroundingConfig,
}

impl GroundingVerifier {
    /// Create a verifier with the given policy and threshold.
    pub fn new(config: GroundingConfig) -> Self {
        Self { config }
    }

    /// Verify a draft, producing the final grounded answer.
    ///
    /// Unsupported segments are dropped (`Strict`) or kept flagged
    /// (`Annotate`). If nothing survives, the fixed insufficient-
    /// information answer is returned; callers never see empty text.
    pub fn verify(&self, draft: &DraftAnswer, evidence: &[RetrievedEvidence]) -> GroundedAnswer {
        if draft.segments.is_empty() {
            return GroundedAnswer::insufficient();
        }

        let total = draft.segments.len();
        let mut segments: Vec<AnswerSegment> = Vec::new();
        let mut supported_count = 0usize;

        for segment in &draft.segments {
            let citations = self.supporting_citations(segment.text.as_str(), &segment.citations, evidence);

            if !citations.is_empty() {
                supported_count += 1;
                segments.push(AnswerSegment {
                    text: segment.text.clone(),
                    confidence: SegmentConfidence::Supported,
                    citations,
                });
            } else {
                match self.config.policy {
                    GroundingPolicy::Strict => {
                        tracing::debug!("Dropping unsupported segment: {}", segment.text);
                    }
                    GroundingPolicy::Annotate => {
                        segments.push(AnswerSegment {
                            text: segment.text.clone(),
                            confidence: SegmentConfidence::Flagged,
                            citations: Vec::new(),
                        });
                    }
                }
            }
        }

        if segments.is_empty() {
            tracing::info!("No draft segment survived grounding verification");
            return GroundedAnswer::insufficient();
        }

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let citations = dedup_citations(&segments);
        let groundedness = supported_count as f32 / total as f32;

        tracing::info!(
            "Grounded answer: {}/{} segments supported ({} citations)",
            supported_count,
            total,
            citations.len()
        );

        GroundedAnswer {
            text,
            segments,
            citations,
            groundedness,
        }
    }

    /// Citations of a segment whose cited chunk plausibly supports it.
    fn supporting_citations(
        &self,
        segment_text: &str,
        claimed: &[usize],
        evidence: &[RetrievedEvidence],
    ) -> Vec<Citation> {
        claimed
            .iter()
            .filter_map(|&idx| evidence.get(idx))
            .filter(|item| plausibly_supports(segment_text, &item.chunk.text, self.config.support_threshold))
            .map(|item| Citation::for_chunk(&item.chunk))
            .collect()
    }
}

/// Deterministic lexical support gate.
///
/// True when at least `threshold` of the segment's salient terms occur
/// in the chunk text. A segment with no salient terms (pure connective
/// phrasing) passes by definition; it makes no checkable claim.
pub fn plausibly_supports(segment: &str, chunk_text: &str, threshold: f32) -> bool {
    let terms = text::salient_terms(segment);
    if terms.is_empty() {
        return true;
    }

    let haystack = text::normalize(chunk_text);
    let hits = terms
        .iter()
        .filter(|term| haystack.contains(term.as_str()))
        .count();

    hits as f32 / terms.len() as f32 >= threshold
}

/// Deduplicate citations across segments, preserving first-seen order.
fn dedup_citations(segments: &[AnswerSegment]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for segment in segments {
        for citation in &segment.citations {
            if seen.insert(citation.chunk_id.clone()) {
                out.push(citation.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkId, DocumentId, DraftSegment, PageRange};

    fn evidence(texts: &[&str]) -> Vec<RetrievedEvidence> {
        let doc = DocumentId::derive("manual.pdf", b"bytes");
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RetrievedEvidence {
                chunk: Chunk {
                    id: ChunkId::derive(&doc, i * 1000),
                    document_id: doc.clone(),
                    position: i as u32,
                    text: text.to_string(),
                    pages: PageRange::single(i as u32 + 1),
                },
                score: 0.8,
            })
            .collect()
    }

    fn segment(text: &str, citations: Vec<usize>) -> DraftSegment {
        let supported = !citations.is_empty();
        DraftSegment {
            text: text.to_string(),
            citations,
            supported,
        }
    }

    fn draft(segments: Vec<DraftSegment>) -> DraftAnswer {
        DraftAnswer {
            raw: segments
                .iter()
                .map(|s| s.text.clone())
                .collect::<Vec<_>>()
                .join(" "),
            segments,
        }
    }

    fn strict() -> GroundingVerifier {
        GroundingVerifier::new(GroundingConfig::default())
    }

    fn annotate() -> GroundingVerifier {
        GroundingVerifier::new(GroundingConfig {
            policy: GroundingPolicy::Annotate,
            support_threshold: 0.30,
        })
    }

    #[test]
    fn test_supported_segment_keeps_citation() {
        let evidence = evidence(&["Tightening torque: 45 Nm for the cylinder head bolts"]);
        let answer = strict().verify(
            &draft(vec![segment("The tightening torque is 45 Nm.", vec![0])]),
            &evidence,
        );

        assert_eq!(answer.segments.len(), 1);
        assert_eq!(answer.segments[0].confidence, SegmentConfidence::Supported);
        assert_eq!(answer.segments[0].citations.len(), 1);
        assert_eq!(
            answer.segments[0].citations[0].chunk_id,
            evidence[0].chunk.id
        );
        assert_eq!(answer.groundedness, 1.0);
    }

    #[test]
    fn test_strict_drops_uncited_segment() {
        let evidence = evidence(&["Tightening torque: 45 Nm"]);
        let answer = strict().verify(
            &draft(vec![
                segment("The tightening torque is 45 Nm.", vec![0]),
                segment("The warranty covers five years.", vec![]),
            ]),
            &evidence,
        );

        assert_eq!(answer.segments.len(), 1);
        assert!(!answer.text.contains("warranty"));
        assert!((answer.groundedness - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_strict_drops_segment_whose_citation_does_not_support_it() {
        // Cited chunk exists but shares no vocabulary with the claim.
        let evidence = evidence(&["Oil change interval: every 500 operating hours"]);
        let answer = strict().verify(
            &draft(vec![segment(
                "The maximum operating pressure is 315 bar.",
                vec![0],
            )]),
            &evidence,
        );

        assert!(answer.is_fallback());
    }

    #[test]
    fn test_annotate_keeps_unsupported_flagged() {
        let evidence = evidence(&["Tightening torque: 45 Nm"]);
        let answer = annotate().verify(
            &draft(vec![
                segment("The tightening torque is 45 Nm.", vec![0]),
                segment("The warranty covers five years.", vec![]),
            ]),
            &evidence,
        );

        assert_eq!(answer.segments.len(), 2);
        assert_eq!(answer.segments[1].confidence, SegmentConfidence::Flagged);
        assert!(answer.segments[1].citations.is_empty());
        assert!(answer.text.contains("warranty"));
    }

    #[test]
    fn test_invalid_citation_index_is_unsupported() {
        let evidence = evidence(&["Tightening torque: 45 Nm"]);
        let answer = strict().verify(
            &draft(vec![segment("The tightening torque is 45 Nm.", vec![7])]),
            &evidence,
        );

        assert!(answer.is_fallback());
    }

    #[test]
    fn test_empty_draft_is_insufficient() {
        let answer = strict().verify(&DraftAnswer::no_evidence(), &[]);
        assert!(answer.is_fallback());
        assert!(!answer.text.is_empty());
    }

    #[test]
    fn test_citations_are_deduplicated() {
        let evidence = evidence(&["Torque 45 Nm and thread locker required for head bolts"]);
        let answer = strict().verify(
            &draft(vec![
                segment("The torque is 45 Nm.", vec![0]),
                segment("Thread locker is required.", vec![0]),
            ]),
            &evidence,
        );

        assert_eq!(answer.segments.len(), 2);
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn test_strict_mode_grounding_invariant() {
        let evidence = evidence(&[
            "Tightening torque: 45 Nm",
            "Operating pressure: 315 bar maximum",
        ]);
        let evidence_ids: Vec<_> = evidence.iter().map(|e| e.chunk.id.clone()).collect();

        let answer = strict().verify(
            &draft(vec![
                segment("The torque is 45 Nm.", vec![0]),
                segment("The maximum operating pressure is 315 bar.", vec![1]),
                segment("Completely invented claim about voltage.", vec![]),
            ]),
            &evidence,
        );

        // Every surviving segment cites a chunk that was retrieved.
        for seg in &answer.segments {
            assert!(!seg.citations.is_empty());
            for citation in &seg.citations {
                assert!(evidence_ids.contains(&citation.chunk_id));
            }
        }
    }

    #[test]
    fn test_support_gate_threshold() {
        let chunk = "Tightening torque: 45 Nm for cylinder head bolts";
        assert!(plausibly_supports("The torque is 45 Nm.", chunk, 0.5));
        assert!(!plausibly_supports(
            "The voltage rating is 24 V DC.",
            chunk,
            0.3
        ));
        // Content-free segment passes
        assert!(plausibly_supports("It is.", chunk, 0.9));
    }
}
