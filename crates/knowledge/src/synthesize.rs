//! Grounded answer synthesis.
//!
//! Builds a prompt that constrains the completion model to the
//! retrieved evidence, requires per-sentence citation markers, and
//! parses the draft back into segments with their claimed citations.
//! Malformed markers never fail synthesis; the affected sentence is
//! just marked unsupported and left to the verifier's policy.

use crate::config::SynthesisConfig;
use crate::types::{DraftAnswer, DraftSegment, RetrievedEvidence};
use manualqa_core::{AppError, AppResult};
use manualqa_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Draft answer synthesizer.
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
    config: SynthesisConfig,
    timeout: Duration,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over an injected completion client.
    pub fn new(client: Arc<dyn LlmClient>, config: SynthesisConfig, timeout: Duration) -> Self {
        Self {
            client,
            config,
            timeout,
        }
    }

    /// Produce a draft answer from the question and its evidence.
    ///
    /// With empty evidence no model call is made and the fixed
    /// no-evidence draft is returned.
    pub async fn synthesize(
        &self,
        question: &str,
        evidence: &[RetrievedEvidence],
    ) -> AppResult<DraftAnswer> {
        if evidence.is_empty() {
            tracing::info!("No evidence for question; skipping generation");
            return Ok(DraftAnswer::no_evidence());
        }

        let request = LlmRequest::new(build_user_prompt(question, evidence), &self.config.model)
            .with_system(build_system_prompt())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        tracing::debug!(
            "Synthesizing answer from {} evidence chunks (model: {})",
            evidence.len(),
            self.config.model
        );

        let response = match tokio::time::timeout(self.timeout, self.client.complete(&request)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(AppError::timeout("synthesizer", self.timeout.as_secs())),
        };

        let segments = parse_draft(&response.content, evidence.len());
        tracing::debug!("Parsed draft into {} segments", segments.len());

        Ok(DraftAnswer {
            raw: response.content,
            segments,
        })
    }
}

/// System prompt: answer only from evidence, cite every sentence.
fn build_system_prompt() -> String {
    String::from(
        "You are a technical documentation assistant answering questions about \
         uploaded manuals.\n\n\
         Instructions:\n\
         - Answer only from the numbered evidence passages provided; never use \
         outside knowledge\n\
         - Distinguish strictly between similar quantities (e.g. operating \
         pressure vs. test pressure, torque vs. clamping force)\n\
         - When a table row answers the question, quote the relevant values \
         exactly as written\n\
         - End every factual sentence with the marker of its supporting \
         passage(s), e.g. [1] or [1,3]\n\
         - If the evidence does not contain the answer, say so plainly\n\
         - Keep the answer concise and factual\n",
    )
}

/// User prompt: enumerated evidence with page provenance, then the
/// question.
fn build_user_prompt(question: &str, evidence: &[RetrievedEvidence]) -> String {
    let mut prompt = String::from("Evidence passages:\n\n");
    for (i, item) in evidence.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] ({}): {}\n\n",
            i + 1,
            item.chunk.pages,
            item.chunk.text
        ));
    }
    prompt.push_str(&format!("Question: {}\n\nAnswer:", question));
    prompt
}

/// Split a draft into sentences and parse each sentence's citation
/// markers into evidence indices.
fn parse_draft(content: &str, evidence_count: usize) -> Vec<DraftSegment> {
    content
        .unicode_sentences()
        .filter_map(|sentence| {
            let (text, citations) = extract_markers(sentence, evidence_count);
            if text.is_empty() {
                return None;
            }
            let supported = !citations.is_empty();
            Some(DraftSegment {
                text,
                citations,
                supported,
            })
        })
        .collect()
}

/// Strip `[n]` / `[n,m]` markers from a sentence and collect the
/// 0-based evidence indices they reference.
///
/// Out-of-range indices are dropped, which leaves the sentence
/// unsupported if nothing valid remains. Bracketed text that is not a
/// marker is left in place.
fn extract_markers(sentence: &str, evidence_count: usize) -> (String, Vec<usize>) {
    let chars: Vec<char> = sentence.chars().collect();
    let mut clean = String::with_capacity(sentence.len());
    let mut citations: Vec<usize> = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '[' {
            if let Some(rel) = chars[i + 1..].iter().position(|&c| c == ']') {
                let inner: String = chars[i + 1..i + 1 + rel].iter().collect();
                let looks_like_marker = !inner.is_empty()
                    && inner.chars().any(|c| c.is_ascii_digit())
                    && inner
                        .chars()
                        .all(|c| c.is_ascii_digit() || c == ',' || c == ' ');

                if looks_like_marker {
                    for part in inner.split(',') {
                        if let Ok(n) = part.trim().parse::<usize>() {
                            if n >= 1 && n <= evidence_count {
                                let idx = n - 1;
                                if !citations.contains(&idx) {
                                    citations.push(idx);
                                }
                            }
                        }
                    }
                    i += rel + 2;
                    continue;
                }
            }
        }
        clean.push(chars[i]);
        i += 1;
    }

    let normalized = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    (fix_trailing_punctuation(normalized), citations)
}

/// Stripping a marker before the period leaves "text ." — pull the
/// punctuation back in.
fn fix_trailing_punctuation(text: String) -> String {
    text.replace(" .", ".").replace(" ,", ",").replace(" !", "!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkId, DocumentId, PageRange, NO_EVIDENCE_DRAFT};
    use manualqa_llm::MockClient;

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
                score: 0.9,
            })
            .collect()
    }

    fn synthesizer(client: MockClient) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            Arc::new(client),
            SynthesisConfig::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_empty_evidence_short_circuits() {
        // A failing client proves no model call is made.
        let synth = synthesizer(MockClient::failing());
        let draft = synth.synthesize("any question", &[]).await.unwrap();

        assert_eq!(draft.raw, NO_EVIDENCE_DRAFT);
        assert!(draft.segments.is_empty());
    }

    #[tokio::test]
    async fn test_draft_parses_markers_per_sentence() {
        let synth = synthesizer(MockClient::with_response(
            "The tightening torque is 45 Nm [1]. This is an uncited claim.",
        ));
        let draft = synth
            .synthesize("torque?", &evidence(&["Torque spec: 45 Nm"]))
            .await
            .unwrap();

        assert_eq!(draft.segments.len(), 2);
        assert!(draft.segments[0].supported);
        assert_eq!(draft.segments[0].citations, vec![0]);
        assert_eq!(draft.segments[0].text, "The tightening torque is 45 Nm.");
        assert!(!draft.segments[1].supported);
        assert!(draft.segments[1].citations.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_marker_is_unsupported() {
        let synth = synthesizer(MockClient::with_response("The value is 7 bar [4]."));
        let draft = synth
            .synthesize("pressure?", &evidence(&["Pressure: 7 bar"]))
            .await
            .unwrap();

        assert_eq!(draft.segments.len(), 1);
        assert!(!draft.segments[0].supported);
    }

    #[tokio::test]
    async fn test_multi_citation_marker() {
        let synth = synthesizer(MockClient::with_response(
            "Use seal kit M and torque 45 Nm [1,2].",
        ));
        let draft = synth
            .synthesize(
                "assembly?",
                &evidence(&["Seal kit M", "Torque spec: 45 Nm"]),
            )
            .await
            .unwrap();

        assert_eq!(draft.segments[0].citations, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_generation_timeout_surfaces_as_collaborator_timeout() {
        let client = MockClient::with_response("slow").with_delay(Duration::from_millis(200));
        let synth = AnswerSynthesizer::new(
            Arc::new(client),
            SynthesisConfig::default(),
            Duration::from_millis(10),
        );

        let err = synth
            .synthesize("q", &evidence(&["some evidence"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CollaboratorTimeout { .. }));
    }

    #[test]
    fn test_extract_markers_leaves_non_marker_brackets() {
        let (text, citations) = extract_markers("See [appendix B] for details [1].", 2);
        assert_eq!(text, "See [appendix B] for details.");
        assert_eq!(citations, vec![0]);
    }

    #[test]
    fn test_user_prompt_enumerates_evidence_with_pages() {
        let prompt = build_user_prompt("torque?", &evidence(&["Torque: 45 Nm", "Oil: 5W-30"]));
        assert!(prompt.contains("[1] (p. 1): Torque: 45 Nm"));
        assert!(prompt.contains("[2] (p. 2): Oil: 5W-30"));
        assert!(prompt.ends_with("Answer:"));
    }
}
