//! Domain types and filtering rules for apply-result webhooks.
//!
//! - [`ApplyResult`] is the event handed to every webhook, and its serde
//!   representation is the JSON body posted to the endpoint.
//! - [`matcher`] holds the [`StringPredicate`] strategies and the
//!   [`MatchRule`] that decides whether an event qualifies for delivery.
//! - [`config`] turns environment variables or a JSON document into
//!   [`WebhookConfig`] entries.

pub mod config;
pub mod error;
pub mod matcher;
pub mod types;

pub use config::{WebhookConfig, EVENT_APPLY, KIND_HTTP};
pub use error::CoreError;
pub use matcher::{MatchRule, PatternSyntax, StringPredicate};
pub use types::ApplyResult;
