//! Filtered, single-attempt HTTP webhook delivery.
//!
//! [`HttpWebhook`] sends a JSON-encoded [`ApplyResult`] to one endpoint via
//! HTTP POST, but only when the event's workspace and base branch pass its
//! [`MatchRule`]. There are no retries: a failed attempt is returned to the
//! caller, which owns any retry policy.

use std::sync::Arc;

use applyhook_core::{ApplyResult, CoreError, MatchRule, WebhookConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use super::endpoint::Endpoint;
use super::transport::{
    HttpTransport, OutboundRequest, ReqwestTransport, TransportError, TransportResponse,
};

// ---------------------------------------------------------------------------
// Outcome / error
// ---------------------------------------------------------------------------

/// Successful result of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The event did not match the webhook's filters; nothing was sent.
    Skipped,
    /// The endpoint accepted the event with a 2xx status.
    Delivered { status: u16 },
}

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The event could not be encoded as JSON.
    #[error("serializing webhook payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No HTTP response was obtained (connect, DNS, timeout, cancellation).
    #[error("sending webhook failed: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-2xx status.
    #[error("sending webhook to {url}: endpoint returned HTTP {status}")]
    RemoteRejection {
        status: u16,
        url: String,
        /// Start of the response body, for debugging.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// WebhookSender
// ---------------------------------------------------------------------------

/// Anything that can deliver an apply result somewhere.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(
        &self,
        event: &ApplyResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryOutcome, WebhookError>;

    /// Short human-readable target description for logs and reports.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// HttpWebhook
// ---------------------------------------------------------------------------

/// Posts matching apply results to a single HTTP endpoint.
///
/// Configuration is immutable after construction, so one instance can be
/// shared across tasks and called concurrently.
pub struct HttpWebhook {
    endpoint: Endpoint,
    rule: MatchRule,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for HttpWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWebhook")
            .field("endpoint", &self.endpoint)
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

impl HttpWebhook {
    pub fn new(endpoint: Endpoint, rule: MatchRule, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            endpoint,
            rule,
            transport,
        }
    }

    /// Use a fresh [`ReqwestTransport`] with the default timeout.
    pub fn with_default_transport(
        endpoint: Endpoint,
        rule: MatchRule,
    ) -> Result<Self, TransportError> {
        Ok(Self::new(endpoint, rule, Arc::new(ReqwestTransport::new()?)))
    }

    /// Validate `config` and build a webhook on top of `transport`.
    pub fn from_config(
        config: &WebhookConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let endpoint = Endpoint::new(&config.url, config.credential())?;
        let rule = config.match_rule()?;
        Ok(Self::new(endpoint, rule, transport))
    }

    /// Send `event` if it matches. Equivalent to
    /// [`send_with_cancel`](Self::send_with_cancel) with a token that is
    /// never cancelled.
    pub async fn send(&self, event: &ApplyResult) -> Result<DeliveryOutcome, WebhookError> {
        self.send_with_cancel(event, &CancellationToken::new()).await
    }

    /// Send `event` if it matches, aborting the request when `cancel` fires.
    ///
    /// Makes exactly one request when the filters pass and none otherwise.
    pub async fn send_with_cancel(
        &self,
        event: &ApplyResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryOutcome, WebhookError> {
        if !self.rule.matches(event) {
            tracing::info!(
                workspace = %event.workspace,
                branch = %event.base_branch,
                url = %self.endpoint.url(),
                "Apply result does not match webhook filters, skipping",
            );
            return Ok(DeliveryOutcome::Skipped);
        }

        let result = self.deliver(event, cancel).await;
        if let Err(e) = &result {
            tracing::error!(
                url = %self.endpoint.url(),
                repo = %event.repo_full_name,
                pull_num = event.pull_num,
                error = %e,
                "Webhook delivery failed",
            );
        }
        result
    }

    async fn deliver(
        &self,
        event: &ApplyResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryOutcome, WebhookError> {
        let request = self.build_request(event)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.transport.post(request) => result,
        };

        classify(self.endpoint.url(), response?)
    }

    fn build_request(&self, event: &ApplyResult) -> Result<OutboundRequest, WebhookError> {
        let body = serde_json::to_vec(event)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(credential) = self.endpoint.credential() {
            headers.insert(AUTHORIZATION, credential.authorization_header().clone());
        }

        Ok(OutboundRequest {
            url: self.endpoint.url().clone(),
            headers,
            body,
        })
    }
}

fn classify(url: &Url, response: TransportResponse) -> Result<DeliveryOutcome, WebhookError> {
    if !response.status.is_success() {
        return Err(WebhookError::RemoteRejection {
            status: response.status.as_u16(),
            url: url.to_string(),
            body: response.body,
        });
    }
    Ok(DeliveryOutcome::Delivered {
        status: response.status.as_u16(),
    })
}

#[async_trait]
impl WebhookSender for HttpWebhook {
    async fn send(
        &self,
        event: &ApplyResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryOutcome, WebhookError> {
        self.send_with_cancel(event, cancel).await
    }

    fn describe(&self) -> String {
        format!("http {}", self.endpoint.url())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
