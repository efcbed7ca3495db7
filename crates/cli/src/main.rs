//! `applyhook` -- send one apply result to every configured webhook.
//!
//! Reads an apply result as JSON from the file given as the first argument,
//! or from stdin when no argument (or `-`) is given, and fans it out to the
//! configured webhooks.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default | Description                               |
//! |---------------------------|----------|---------|-------------------------------------------|
//! | `WEBHOOK_URL`             | yes*     | --      | Single webhook endpoint                   |
//! | `WEBHOOK_TOKEN`           | no       | --      | Bearer credential, empty means no auth    |
//! | `WEBHOOK_WORKSPACE_REGEX` | no       | `.*`    | Workspace filter                          |
//! | `WEBHOOK_BRANCH_REGEX`    | no       | `.*`    | Base branch filter                        |
//! | `WEBHOOK_PATTERN_SYNTAX`  | no       | `regex` | `regex`, `glob` or `exact`                |
//! | `WEBHOOKS_CONFIG`         | yes*     | --      | Path to a JSON array of webhook configs   |
//! | `WEBHOOK_TIMEOUT_SECS`    | no       | `10`    | Per-request timeout                       |
//!
//! \* at least one of `WEBHOOK_URL` / `WEBHOOKS_CONFIG`.
//!
//! Exits non-zero when any webhook fails, after all of them were attempted.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use applyhook_core::{ApplyResult, CoreError, WebhookConfig};
use applyhook_events::{MultiWebhookSender, ReqwestTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default per-request timeout for the shared HTTP client.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "applyhook=info,applyhook_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let configs = WebhookConfig::load_from_env().context("loading webhook configuration")?;

    let timeout = request_timeout(std::env::var("WEBHOOK_TIMEOUT_SECS").ok().as_deref())?;

    let transport = ReqwestTransport::with_timeout(timeout).context("building HTTP client")?;
    let sender = MultiWebhookSender::from_configs(&configs, Arc::new(transport))
        .context("validating webhook configuration")?;

    let event = read_event(std::env::args().nth(1).as_deref())?;

    tracing::info!(
        webhooks = sender.len(),
        workspace = %event.workspace,
        repo = %event.repo_full_name,
        pull_num = event.pull_num,
        "Dispatching apply result",
    );

    let report = sender.send(&event).await;

    tracing::info!(
        delivered = report.delivered,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Dispatch finished",
    );

    if !report.is_clean() {
        for (target, e) in &report.failures {
            tracing::warn!(webhook = %target, error = %e, "Webhook not delivered");
        }
        anyhow::bail!("{} webhook(s) failed", report.failures.len());
    }
    Ok(())
}

/// Parse `WEBHOOK_TIMEOUT_SECS`. Unset or blank means the default; zero is rejected.
fn request_timeout(raw: Option<&str>) -> Result<Duration, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };

    match raw.parse::<u64>() {
        Ok(0) => Err(CoreError::InvalidConfig {
            key: "WEBHOOK_TIMEOUT_SECS",
            reason: "must be at least 1 second".into(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(CoreError::InvalidConfig {
            key: "WEBHOOK_TIMEOUT_SECS",
            reason: format!("{raw:?} is not a whole number of seconds"),
        }),
    }
}

/// Parse the apply result from `path`, or stdin for `None` / `-`.
fn read_event(path: Option<&str>) -> anyhow::Result<ApplyResult> {
    let raw = match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading apply result from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading apply result from {path}"))?,
    };

    serde_json::from_str(&raw).context("parsing apply result JSON")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_event_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"workspace":"production","repo":"org/repo","pull_num":1,"pull_url":"url",
               "base_branch":"main","user":"alice","success":true}}"#
        )
        .unwrap();

        let event = read_event(file.path().to_str()).unwrap();
        assert_eq!(event.workspace, "production");
        assert_eq!(event.repo_full_name, "org/repo");
        assert!(event.success);
    }

    #[test]
    fn malformed_event_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_event(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("parsing apply result JSON"));
    }

    #[test]
    fn timeout_defaults_when_unset_or_blank() {
        assert_eq!(request_timeout(None).unwrap(), Duration::from_secs(10));
        assert_eq!(request_timeout(Some("  ")).unwrap(), Duration::from_secs(10));
        assert_eq!(request_timeout(Some("3")).unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        for raw in ["0", "-1", "ten"] {
            let err = request_timeout(Some(raw)).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidConfig { key: "WEBHOOK_TIMEOUT_SECS", .. }),
                "{raw:?} was accepted"
            );
        }
    }

    #[test]
    fn missing_event_file_is_an_error() {
        let err = read_event(Some("/nonexistent/apply-result.json")).unwrap_err();
        assert!(err.to_string().contains("reading apply result from"));
    }
}
