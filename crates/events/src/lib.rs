//! Outbound webhook delivery for apply results.
//!
//! - [`HttpWebhook`] filters an [`ApplyResult`](applyhook_core::ApplyResult)
//!   through its [`MatchRule`](applyhook_core::MatchRule) and, when it
//!   qualifies, POSTs it as JSON to a single [`Endpoint`].
//! - [`HttpTransport`] is the seam between the dispatcher and the network;
//!   [`ReqwestTransport`] is the pooled default.
//! - [`MultiWebhookSender`] fans one event out to every configured webhook
//!   without letting a single failure abort the rest.

pub mod delivery;
pub mod fanout;

pub use delivery::endpoint::{Credential, Endpoint};
pub use delivery::transport::{
    HttpTransport, OutboundRequest, ReqwestTransport, TransportError, TransportResponse,
    DEFAULT_REQUEST_TIMEOUT, MAX_REJECTION_BODY_BYTES,
};
pub use delivery::webhook::{DeliveryOutcome, HttpWebhook, WebhookError, WebhookSender};
pub use fanout::{FanOutReport, MultiWebhookSender};
