//! The network seam used by [`HttpWebhook`](super::webhook::HttpWebhook).
//!
//! Production code uses [`ReqwestTransport`], which wraps a pooled
//! [`reqwest::Client`]. Tests substitute a recording double.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};

/// Request timeout applied by [`ReqwestTransport::new`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on how much of a non-2xx response body is kept.
pub const MAX_REJECTION_BODY_BYTES: usize = 4 * 1024;

/// How long to wait for a non-2xx response body before giving up on it.
const REJECTION_BODY_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure to obtain any HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The caller cancelled the request before a response arrived.
    #[error("HTTP request cancelled")]
    Cancelled,

    /// Failure reported by a non-reqwest transport.
    #[error("HTTP transport error: {0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A fully built POST request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Status of whatever the endpoint answered.
///
/// `body` is only populated for non-2xx responses, truncated to
/// [`MAX_REJECTION_BODY_BYTES`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `request` and return the response, whatever its status.
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// ReqwestTransport
// ---------------------------------------------------------------------------

/// [`HttpTransport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Reuse an existing client (and its connection pool and timeout policy).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        // Success is decided by the status line alone; the body is never awaited.
        let status = response.status();
        if status.is_success() {
            return Ok(TransportResponse {
                status,
                body: String::new(),
            });
        }

        let body = read_rejection_body(&mut response).await;
        Ok(TransportResponse { status, body })
    }
}

/// Read at most [`MAX_REJECTION_BODY_BYTES`] of `response`, for at most
/// [`REJECTION_BODY_TIMEOUT`]. Whatever arrived by then is kept; read errors
/// only end the read early.
async fn read_rejection_body(response: &mut reqwest::Response) -> String {
    let deadline = tokio::time::Instant::now() + REJECTION_BODY_TIMEOUT;
    let mut buf = Vec::new();

    while buf.len() < MAX_REJECTION_BODY_BYTES {
        match tokio::time::timeout_at(deadline, response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                let take = chunk.len().min(MAX_REJECTION_BODY_BYTES - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Failed to read webhook rejection body");
                break;
            }
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every request and answers with a fixed status, or fails.
    #[derive(Debug)]
    pub struct RecordingTransport {
        status: Option<StatusCode>,
        requests: Mutex<Vec<OutboundRequest>>,
    }

    impl RecordingTransport {
        pub fn responding(status: StatusCode) -> Self {
            Self {
                status: Some(status),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Every call fails with a transport error.
        pub fn unreachable() -> Self {
            Self {
                status: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<OutboundRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn post(
            &self,
            request: OutboundRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            match self.status {
                Some(status) => Ok(TransportResponse {
                    status,
                    body: String::new(),
                }),
                None => Err(TransportError::Other("connection refused".into())),
            }
        }
    }

    /// Never answers; only cancellation can end the call.
    #[derive(Debug, Default)]
    pub struct HangingTransport;

    #[async_trait]
    impl HttpTransport for HangingTransport {
        async fn post(
            &self,
            _request: OutboundRequest,
        ) -> Result<TransportResponse, TransportError> {
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn cancelled_error_display() {
        assert_eq!(TransportError::Cancelled.to_string(), "HTTP request cancelled");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = TransportError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
