//! Text normalization, salient-term extraction, and query expansion.
//!
//! Shared by the mock embedder, the lexical ranking in hybrid
//! retrieval, and the grounding verifier's support check, so all three
//! agree on what counts as a salient term.

use std::collections::BTreeSet;
use std::collections::HashSet;

/// English stop words filtered out of salient-term extraction.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "when", "where", "how", "does", "do", "can",
    "will", "should", "into", "than", "then", "also", "not",
];

/// Lowercase, strip punctuation (keeping word-internal `-./:`), and
/// collapse whitespace.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_alphanumeric() || matches!(ch, '-' | '.' | ':' | '/') {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content-bearing terms of a text: normalized tokens with stop words
/// and very short tokens removed.
pub fn salient_terms(input: &str) -> Vec<String> {
    let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    normalize(input)
        .split_whitespace()
        .filter(|w| w.len() > 2 && !stop_words.contains(w))
        .map(|w| w.trim_matches(|c: char| matches!(c, '.' | ':' | '/')).to_string())
        .filter(|w| w.len() > 2)
        .collect()
}

/// Domain synonym table for query expansion.
///
/// Technical manuals use inconsistent vocabulary for the same quantity
/// (torque vs. Nm, pressure vs. bar/psi); expanding the query with
/// synonym groups lets retrieval find passages phrased either way. A
/// matched group contributes all of its terms to the expanded query.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    groups: Vec<Vec<String>>,
}

impl SynonymTable {
    /// An empty table; expansion becomes plain normalization.
    pub fn new() -> Self {
        Self::default()
    }

    /// A starter table for technical-manual vocabulary.
    pub fn technical_defaults() -> Self {
        let groups = [
            &["torque", "nm", "tightening"][..],
            &["pressure", "bar", "psi", "mpa"][..],
            &["flow", "l/min", "m3/h", "volumetric"][..],
            &["seal", "sealing", "gasket", "o-ring"][..],
            &["temperature", "thermal", "celsius"][..],
            &["error", "fault", "code"][..],
        ];
        Self {
            groups: groups
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    /// Add a synonym group.
    pub fn with_group<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push(terms.into_iter().map(|t| t.into().to_lowercase()).collect());
        self
    }

    /// Expand a question into a normalized term set.
    ///
    /// The output is sorted for determinism: the same question always
    /// produces the same expanded string, and so the same embedding.
    pub fn expand(&self, question: &str) -> String {
        let base = normalize(question);
        let tokens: HashSet<&str> = base.split_whitespace().collect();

        let mut expansion: BTreeSet<String> =
            tokens.iter().map(|t| t.to_string()).collect();

        for group in &self.groups {
            if group.iter().any(|term| tokens.contains(term.as_str())) {
                expansion.extend(group.iter().cloned());
            }
        }

        expansion.into_iter().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(
            normalize("What is the Torque-Spec (45 Nm)?"),
            "what is the torque-spec 45 nm"
        );
    }

    #[test]
    fn test_salient_terms_drop_stop_words() {
        let terms = salient_terms("What is the maximum operating pressure?");
        assert_eq!(terms, vec!["maximum", "operating", "pressure"]);
    }

    #[test]
    fn test_expand_without_groups_is_normalization() {
        let table = SynonymTable::new();
        let expanded = table.expand("Check the torque");
        assert!(expanded.contains("torque"));
        assert!(expanded.contains("check"));
    }

    #[test]
    fn test_expand_adds_matched_group() {
        let table = SynonymTable::new().with_group(["torque", "nm", "tightening"]);
        let expanded = table.expand("What is the torque spec?");

        assert!(expanded.contains("nm"));
        assert!(expanded.contains("tightening"));
        // Unmatched groups contribute nothing
        let table2 = table.with_group(["voltage", "volt"]);
        let expanded2 = table2.expand("What is the torque spec?");
        assert!(!expanded2.contains("voltage"));
    }

    #[test]
    fn test_expand_is_deterministic() {
        let table = SynonymTable::technical_defaults();
        let a = table.expand("Max pressure of the pump?");
        let b = table.expand("Max pressure of the pump?");
        assert_eq!(a, b);
    }
}
