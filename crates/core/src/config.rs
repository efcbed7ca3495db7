use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;
use crate::matcher::{MatchRule, PatternSyntax, MATCH_ALL};

/// The only event webhooks can currently subscribe to.
pub const EVENT_APPLY: &str = "apply";

/// Plain HTTP POST webhook.
pub const KIND_HTTP: &str = "http";

/// One configured webhook.
///
/// Deserialized from the JSON array pointed to by `WEBHOOKS_CONFIG`, or
/// assembled from the single-webhook `WEBHOOK_*` environment variables.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Event that triggers the webhook. Must be [`EVENT_APPLY`].
    pub event: String,

    /// Delivery kind. Must be [`KIND_HTTP`].
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Endpoint the event is posted to.
    pub url: String,

    /// Bearer credential. `None` and `Some("")` both mean no auth.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default, alias = "workspace-regex")]
    pub workspace_regex: Option<String>,

    #[serde(default, alias = "branch-regex")]
    pub branch_regex: Option<String>,

    #[serde(default, alias = "pattern-syntax")]
    pub pattern_syntax: PatternSyntax,
}

fn default_kind() -> String {
    KIND_HTTP.to_string()
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("event", &self.event)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("token", &self.credential().map(|_| "[REDACTED]"))
            .field("workspace_regex", &self.workspace_regex)
            .field("branch_regex", &self.branch_regex)
            .field("pattern_syntax", &self.pattern_syntax)
            .finish()
    }
}

impl WebhookConfig {
    /// An `apply` HTTP webhook for `url` that matches every workspace and branch.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            event: EVENT_APPLY.to_string(),
            kind: KIND_HTTP.to_string(),
            url: url.into(),
            token: None,
            workspace_regex: None,
            branch_regex: None,
            pattern_syntax: PatternSyntax::default(),
        }
    }

    /// Reject events and kinds this build cannot deliver.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.event != EVENT_APPLY {
            return Err(CoreError::UnsupportedEvent(self.event.clone()));
        }
        if self.kind != KIND_HTTP {
            return Err(CoreError::UnsupportedKind(self.kind.clone()));
        }
        if self.url.trim().is_empty() {
            return Err(CoreError::InvalidEndpoint("url is empty".into()));
        }
        Ok(())
    }

    /// Compile the workspace and branch filters. Missing filters match everything.
    pub fn match_rule(&self) -> Result<MatchRule, CoreError> {
        MatchRule::compile(
            self.pattern_syntax,
            self.workspace_regex.as_deref().unwrap_or(MATCH_ALL),
            self.branch_regex.as_deref().unwrap_or(MATCH_ALL),
        )
    }

    /// The bearer credential, if one is configured and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Parse a JSON array of webhook configs.
    pub fn list_from_json(raw: &str) -> Result<Vec<Self>, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a JSON array of webhook configs from disk.
    pub fn list_from_file(path: impl AsRef<Path>) -> Result<Vec<Self>, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::list_from_json(&raw)
    }

    /// Load every configured webhook from environment variables.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `WEBHOOKS_CONFIG`         | --      |
    /// | `WEBHOOK_URL`             | --      |
    /// | `WEBHOOK_TOKEN`           | --      |
    /// | `WEBHOOK_WORKSPACE_REGEX` | `.*`    |
    /// | `WEBHOOK_BRANCH_REGEX`    | `.*`    |
    /// | `WEBHOOK_PATTERN_SYNTAX`  | `regex` |
    ///
    /// At least one of `WEBHOOKS_CONFIG` or `WEBHOOK_URL` must be set.
    pub fn load_from_env() -> Result<Vec<Self>, CoreError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`load_from_env`](Self::load_from_env) with an injectable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Vec<Self>, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut configs = match lookup("WEBHOOKS_CONFIG").filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::list_from_file(path.trim())?,
            None => Vec::new(),
        };

        if let Some(single) = Self::single_from_vars(&lookup)? {
            configs.push(single);
        }

        if configs.is_empty() {
            return Err(CoreError::MissingConfig("WEBHOOK_URL or WEBHOOKS_CONFIG"));
        }
        Ok(configs)
    }

    fn single_from_vars<F>(lookup: &F) -> Result<Option<Self>, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(url) = lookup("WEBHOOK_URL").filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        let pattern_syntax = match lookup("WEBHOOK_PATTERN_SYNTAX") {
            Some(raw) if !raw.trim().is_empty() => {
                raw.parse().map_err(|_| CoreError::InvalidConfig {
                    key: "WEBHOOK_PATTERN_SYNTAX",
                    reason: format!("{raw:?} is not one of regex, glob, exact"),
                })?
            }
            _ => PatternSyntax::default(),
        };

        Ok(Some(Self {
            event: EVENT_APPLY.to_string(),
            kind: KIND_HTTP.to_string(),
            url: url.trim().to_string(),
            token: lookup("WEBHOOK_TOKEN"),
            workspace_regex: lookup("WEBHOOK_WORKSPACE_REGEX"),
            branch_regex: lookup("WEBHOOK_BRANCH_REGEX"),
            pattern_syntax,
        }))
    }
}
