//! Client side of the dispatch RPC.
//!
//! [`DispatchClient`] is the seam the pool is written against;
//! [`HttpDispatchClient`] talks JSON over HTTP to the dispatch listener
//! using [`reqwest`].

use std::time::Duration;

use abacus_core::dispatch::{TaskReport, WorkItem, CLAIM_PATH, REPORT_PATH};
use reqwest::StatusCode;

/// Errors from a dispatch call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchClientError {
    /// The dispatcher has no ready task right now.
    #[error("no work available")]
    NoWork,

    /// The dispatcher answered with a non-2xx status.
    #[error("dispatcher rejected the call ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The HTTP request itself failed (network, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Operations a worker needs from the dispatcher.
#[async_trait::async_trait]
pub trait DispatchClient: Send + Sync {
    /// Claim one ready task. Returns [`DispatchClientError::NoWork`] when
    /// nothing is ready.
    async fn claim(&self) -> Result<WorkItem, DispatchClientError>;

    /// Report the result of a claimed task.
    async fn report(&self, report: &TaskReport) -> Result<(), DispatchClientError>;
}

/// HTTP client for one dispatch listener.
pub struct HttpDispatchClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDispatchClient {
    /// Create a client for `base_url`, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DispatchClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into [`DispatchClientError::Rejected`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DispatchClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DispatchClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl DispatchClient for HttpDispatchClient {
    async fn claim(&self) -> Result<WorkItem, DispatchClientError> {
        let response = self.client.post(self.url(CLAIM_PATH)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DispatchClientError::NoWork);
        }
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<WorkItem>().await?)
    }

    async fn report(&self, report: &TaskReport) -> Result<(), DispatchClientError> {
        let response = self
            .client
            .post(self.url(REPORT_PATH))
            .json(report)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
