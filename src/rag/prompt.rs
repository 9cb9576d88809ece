//! Prompt composition.
//!
//! History arrives from the caller as ordered human/assistant pairs and is
//! serialized oldest-first. Follow-up questions can be condensed into
//! standalone questions so pronouns ("it", "that") survive across turns.

use serde::{Deserialize, Serialize};

use super::chunker::PassageChunk;

pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// One prior exchange, caller-supplied and read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub human: String,
    pub assistant: String,
}

/// Serializes history as a `Human:`/`Assistant:` transcript, oldest first.
pub fn serialize_transcript(history: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str("Human: ");
        out.push_str(&turn.human);
        out.push_str("\nAssistant: ");
        out.push_str(&turn.assistant);
        out.push('\n');
    }
    out
}

/// Joins passage contents into one context block.
pub fn combine_documents(chunks: &[PassageChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Prompt that rewrites a follow-up into a self-contained question.
pub fn condense_question_prompt(transcript: &str, question: &str) -> String {
    format!(
        "Given the following conversation and a follow up question, rephrase the \
follow up question to be a standalone question that can be understood without \
the conversation.\n\nChat History:\n{transcript}\nFollow Up Input: {question}\nStandalone question:"
    )
}

/// Prompt for the final answer.
///
/// The instruction set is a product requirement: answer from the context when
/// it is relevant, fall back to general knowledge when it is not, and never
/// state a lack of information or name the sources.
pub fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Use the following pieces of context to answer \
the question at the end. If the context is not relevant to the question, answer \
from your own knowledge. Never say that you do not have enough information, and \
never mention the context or where it came from.\n\nContext:\n{context}\n\nQuestion: {question}\nHelpful answer:"
    )
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
    fn transcript_is_oldest_first() {
        let history = vec![
            ConversationTurn {
                human: "What is Sibyl?".to_string(),
                assistant: "A chat backend.".to_string(),
            },
            ConversationTurn {
                human: "Who built it?".to_string(),
                assistant: "Our team.".to_string(),
            },
        ];
        let transcript = serialize_transcript(&history);
        assert_eq!(
            transcript,
            "Human: What is Sibyl?\nAssistant: A chat backend.\nHuman: Who built it?\nAssistant: Our team.\n"
        );
    }

    #[test]
    fn single_document_context_equals_its_content() {
        let chunks = vec![chunk("We offer consulting services for X.")];
        assert_eq!(combine_documents(&chunks), "We offer consulting services for X.");
    }

    #[test]
    fn documents_joined_with_blank_line() {
        let chunks = vec![chunk("first"), chunk("second")];
        assert_eq!(combine_documents(&chunks), "first\n\nsecond");
    }

    #[test]
    fn answer_prompt_carries_question_and_context() {
        let prompt = answer_prompt("ctx body", "What services?");
        assert!(prompt.contains("ctx body"));
        assert!(prompt.contains("Question: What services?"));
        assert!(prompt.contains("never mention the context"));
    }
}
