use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Seam for the remote embedding/generation model.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Single-prompt text generation.
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;

    /// Embed one text. Unused at query time today; the ingestion side and
    /// tests share this seam.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}
