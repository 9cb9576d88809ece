use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::AppConfig;
use crate::llm::remote::RemoteGenerationClient;
use crate::llm::retry::RetryPolicy;
use crate::rag::chunker::ChunkError;
use crate::rag::index::RemoteVectorIndex;
use crate::rag::orchestrator::KnowledgePipeline;
use crate::web::renderer::HttpRenderer;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to build knowledge pipeline: {0}")]
    Pipeline(#[from] ChunkError),
}

/// Shared application state: read-only config plus the request pipeline.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<KnowledgePipeline>,
}

impl AppState {
    /// Wires the remote index client, the generation client, and the HTTP
    /// renderer into one pipeline. Config is assumed validated.
    pub fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let config = Arc::new(config);
        let retry = RetryPolicy::from(&config.retry);

        let service_client = reqwest::Client::new();
        let index = Arc::new(RemoteVectorIndex::new(
            &config.index,
            service_client.clone(),
            retry.clone(),
        ));
        let llm = Arc::new(RemoteGenerationClient::new(
            &config.llm,
            service_client,
            retry,
        ));

        let render_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.crawl.nav_timeout_secs))
            .build()
            .map_err(InitializationError::HttpClient)?;
        let renderer = Arc::new(HttpRenderer::new(render_client));

        let pipeline = Arc::new(KnowledgePipeline::new(
            Arc::clone(&config),
            index,
            llm,
            renderer,
        )?);

        Ok(Arc::new(AppState { config, pipeline }))
    }
}
