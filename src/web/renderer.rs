//! Page-fetching seam.
//!
//! `PageRenderer` is where a headless browser would sit; the shipped
//! implementation is a plain HTTP fetch with a bounded navigation timeout.
//! A render failure is page-scoped: callers absorb it and move on, it never
//! fails the whole request. The response is fully consumed per call, so no
//! connection or body is left dangling on any path.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// A fetched page. `final_url` is the post-redirect location; links must be
/// resolved against it, not the URL that was requested.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub final_url: Url,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    BadStatus {
        url: Url,
        status: reqwest::StatusCode,
    },
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError>;
}

/// HTTP-backed renderer. The navigation timeout lives on the shared client.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| RenderError::Navigation {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::BadStatus {
                url: url.clone(),
                status,
            });
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|source| RenderError::Navigation {
                url: url.clone(),
                source,
            })?;

        Ok(RenderedPage { final_url, html })
    }
}
