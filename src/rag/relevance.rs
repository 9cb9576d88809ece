//! Lexical relevance scoring and filtering.
//!
//! A passage's score is the number of distinct, sufficiently-long question
//! tokens found (case-insensitive) in its content. Scores are used for
//! thresholding only; callers should not rely on any output ordering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::chunker::PassageChunk;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Question tokens at or below this length are ignored.
    pub min_token_len: usize,
    /// A chunk is relevant when its score reaches this value.
    pub min_score: usize,
    /// When set, a chunk at least this many characters long is admitted
    /// regardless of score.
    pub admit_long_chars: Option<usize>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            min_score: 1,
            admit_long_chars: None,
        }
    }
}

/// A passage paired with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub chunk: PassageChunk,
    pub score: usize,
}

/// Counts distinct question tokens longer than `min_token_len` that appear
/// as substrings of the lowercased content.
pub fn score(question: &str, content: &str, min_token_len: usize) -> usize {
    let content = content.to_lowercase();
    let tokens: HashSet<String> = question
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.len() > min_token_len)
        .collect();

    tokens.iter().filter(|t| content.contains(t.as_str())).count()
}

/// Applies the configured threshold, keeping chunks whose score reaches
/// `min_score` or whose content length meets the long-passage override.
pub fn filter_relevant(
    question: &str,
    chunks: Vec<PassageChunk>,
    config: &RelevanceConfig,
) -> Vec<PassageChunk> {
    chunks
        .into_iter()
        .map(|chunk| {
            let score = score(question, &chunk.content, config.min_token_len);
            ScoredPassage { chunk, score }
        })
        .filter(|scored| {
            scored.score >= config.min_score
                || config
                    .admit_long_chars
                    .is_some_and(|n| scored.chunk.content.chars().count() >= n)
        })
        .map(|scored| scored.chunk)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::SourceKind;

    fn chunk(content: &str) -> PassageChunk {
        PassageChunk {
            content: content.to_string(),
            source: "doc.txt".to_string(),
            chunk_index: 0,
            kind: SourceKind::Document,
        }
    }

    #[test]
    fn counts_distinct_matching_tokens() {
        let passage = "Our services include consulting and training programs.";
        assert_eq!(score("What services and training", passage, 3), 2);
    }

    #[test]
    fn repeated_tokens_count_once() {
        let passage = "services services services";
        assert_eq!(score("services services", passage, 3), 1);
    }

    #[test]
    fn case_symmetric() {
        let passage = "Hello there, world traveler.";
        assert_eq!(
            score("Hello World", passage, 3),
            score("hello world", passage, 3)
        );
    }

    #[test]
    fn short_tokens_ignored() {
        let passage = "it is an ox";
        assert_eq!(score("it is an ox", passage, 3), 0);
        // lowering the threshold admits them
        assert!(score("it is an ox", passage, 1) > 0);
    }

    #[test]
    fn filter_applies_min_score() {
        let chunks = vec![chunk("pricing details here"), chunk("nothing related")];
        let config = RelevanceConfig::default();
        let kept = filter_relevant("What is the pricing?", chunks, &config);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].content.contains("pricing"));
    }

    #[test]
    fn long_passage_override_admits_unscored_chunk() {
        let long = "x".repeat(400);
        let chunks = vec![chunk(&long)];
        let config = RelevanceConfig {
            admit_long_chars: Some(300),
            ..Default::default()
        };
        let kept = filter_relevant("unrelated question", chunks, &config);
        assert_eq!(kept.len(), 1);
    }
}
