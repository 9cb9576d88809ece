//! Vector index seam.
//!
//! The index itself is an external nearest-neighbor service, pre-populated by
//! a separate ingestion pipeline. This module defines the trait the
//! orchestrator consumes and the HTTP client for the remote service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::IndexConfig;
use crate::core::errors::ApiError;
use crate::llm::retry::{is_transient_reqwest, with_backoff, RetryPolicy};

/// A passage as stored in the remote index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexedPassage {
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub chunk_index: usize,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest-neighbor search for the sanitized query text.
    async fn search(&self, query: &str) -> Result<Vec<IndexedPassage>, ApiError>;
}

/// HTTP client for a namespace-scoped remote index.
pub struct RemoteVectorIndex {
    base_url: String,
    index_name: String,
    namespace: String,
    top_k: usize,
    client: Client,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Vec<IndexedPassage>,
}

impl RemoteVectorIndex {
    pub fn new(config: &IndexConfig, client: Client, retry: RetryPolicy) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            index_name: config.name.clone(),
            namespace: config.namespace.clone(),
            top_k: config.top_k,
            client,
            retry,
        }
    }
}

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn search(&self, query: &str) -> Result<Vec<IndexedPassage>, ApiError> {
        let url = format!("{}/indexes/{}/query", self.base_url, self.index_name);
        let body = json!({
            "query": query,
            "namespace": self.namespace,
            "top_k": self.top_k,
        });

        let res = with_backoff(
            &self.retry,
            || self.client.post(&url).json(&body).send(),
            is_transient_reqwest,
        )
        .await
        .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "index query failed: {}",
                res.status()
            )));
        }

        let payload: QueryResponse = res.json().await.map_err(ApiError::upstream)?;
        Ok(payload.matches)
    }
}
