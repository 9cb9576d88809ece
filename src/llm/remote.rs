//! OpenAI-compatible HTTP client for generation and embeddings.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;
use crate::llm::provider::GenerationProvider;
use crate::llm::retry::{is_transient_reqwest, with_backoff, RetryPolicy};

pub struct RemoteGenerationClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    retry: RetryPolicy,
}

impl RemoteGenerationClient {
    pub fn new(config: &LlmConfig, client: Client, retry: RetryPolicy) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
            retry,
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let res = with_backoff(
            &self.retry,
            || self.authorized(self.client.post(url)).json(body).send(),
            is_transient_reqwest,
        )
        .await
        .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "generation service returned {status}: {text}"
            )));
        }

        res.json().await.map_err(ApiError::upstream)
    }
}

#[async_trait]
impl GenerationProvider for RemoteGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        let payload = self.post_json(&url, &body).await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let payload = self.post_json(&url, &body).await?;
        let embedding = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| ApiError::Upstream("embedding response missing data".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();
        Ok(embedding)
    }
}
