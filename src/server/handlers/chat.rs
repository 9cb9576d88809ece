//! The /chat handler and its wire DTOs.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::rag::chunker::{PassageChunk, SourceKind};
use crate::rag::prompt::ConversationTurn;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: Option<String>,
    /// Ordered [human, assistant] pairs, oldest first.
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(rename = "sourceDocuments")]
    pub source_documents: Vec<SourceDocument>,
}

#[derive(Debug, Serialize)]
pub struct SourceDocument {
    pub content: String,
    pub metadata: SourceMetadata,
}

#[derive(Debug, Serialize)]
pub struct SourceMetadata {
    pub source: String,
    #[serde(rename = "chunkIndex")]
    pub chunk_index: usize,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

impl From<PassageChunk> for SourceDocument {
    fn from(chunk: PassageChunk) -> Self {
        Self {
            content: chunk.content,
            metadata: SourceMetadata {
                source: chunk.source,
                chunk_index: chunk.chunk_index,
                kind: chunk.kind,
            },
        }
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = request
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("question is required".to_string()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);
    tracing::info!(
        parent: &span,
        history_turns = request.history.len(),
        "chat request received"
    );

    let history: Vec<ConversationTurn> = request
        .history
        .iter()
        .map(|(human, assistant)| ConversationTurn {
            human: human.clone(),
            assistant: assistant.clone(),
        })
        .collect();

    let outcome = state
        .pipeline
        .answer(question, &history)
        .instrument(span)
        .await?;

    Ok(Json(ChatResponse {
        text: outcome.text,
        source_documents: outcome.sources.into_iter().map(SourceDocument::from).collect(),
    }))
}
