//! Fan-out of one apply result to every configured webhook.
//!
//! [`MultiWebhookSender`] calls each sender in registration order. A
//! failing webhook never stops the others and never propagates to the
//! caller: the apply that produced the event has already happened, so a
//! notification failure is reported, not raised.

use std::sync::Arc;

use applyhook_core::{ApplyResult, CoreError, WebhookConfig};
use tokio_util::sync::CancellationToken;

use crate::delivery::transport::HttpTransport;
use crate::delivery::webhook::{DeliveryOutcome, HttpWebhook, WebhookError, WebhookSender};

/// Per-event summary returned by [`MultiWebhookSender::send`].
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub delivered: usize,
    pub skipped: usize,
    /// `(sender description, error)` for every failed webhook.
    pub failures: Vec<(String, WebhookError)>,
}

impl FanOutReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct MultiWebhookSender {
    senders: Vec<Arc<dyn WebhookSender>>,
}

impl std::fmt::Debug for MultiWebhookSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiWebhookSender")
            .field("senders", &self.senders.len())
            .finish()
    }
}

impl MultiWebhookSender {
    pub fn new(senders: Vec<Arc<dyn WebhookSender>>) -> Self {
        Self { senders }
    }

    /// Build one [`HttpWebhook`] per config, all sharing `transport`.
    ///
    /// Fails on the first invalid entry so misconfiguration surfaces at
    /// startup rather than on the first apply.
    pub fn from_configs(
        configs: &[WebhookConfig],
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, CoreError> {
        let senders = configs
            .iter()
            .map(|config| {
                HttpWebhook::from_config(config, Arc::clone(&transport))
                    .map(|hook| Arc::new(hook) as Arc<dyn WebhookSender>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { senders })
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub async fn send(&self, event: &ApplyResult) -> FanOutReport {
        self.send_with_cancel(event, &CancellationToken::new()).await
    }

    pub async fn send_with_cancel(
        &self,
        event: &ApplyResult,
        cancel: &CancellationToken,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();

        for sender in &self.senders {
            match sender.send(event, cancel).await {
                Ok(DeliveryOutcome::Delivered { .. }) => report.delivered += 1,
                Ok(DeliveryOutcome::Skipped) => report.skipped += 1,
                Err(e) => report.failures.push((sender.describe(), e)),
            }
        }

        tracing::debug!(
            webhooks = self.senders.len(),
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Apply result fan-out complete",
        );
        report
    }
}
