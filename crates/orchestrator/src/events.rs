//! Alert lifecycle subscribers.

use alert_core::{Alert, HookError, MessageResult};
use async_trait::async_trait;
use tracing::info;

/// A subscriber to alert lifecycle events.
///
/// Registered collaborators (API layer, persistence, analytics) receive
/// each event after the orchestrator has updated its own state. Every
/// invocation is isolated: one subscriber failing is logged and the
/// remaining subscribers still run. Subscribers must not block; anything
/// slow belongs on the subscriber's own task.
///
/// All methods default to no-ops so a subscriber only implements the
/// events it cares about.
#[async_trait]
pub trait AlertSubscriber: Send + Sync {
    /// A trigger was accepted and an alert is awaiting confirmation.
    async fn on_alert_triggered(&self, _alert: &Alert) -> Result<(), HookError> {
        Ok(())
    }

    /// An alert resolved as confirmed (explicitly or by timeout) and
    /// dispatch has completed.
    async fn on_alert_confirmed(&self, _alert: &Alert) -> Result<(), HookError> {
        Ok(())
    }

    /// An alert was cancelled during its confirmation window.
    async fn on_alert_cancelled(&self, _alert: &Alert) -> Result<(), HookError> {
        Ok(())
    }

    /// Delivery results are available for a confirmed alert.
    async fn on_messages_sent(
        &self,
        _alert_id: &str,
        _results: &[MessageResult],
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Human-readable subscriber name for logs.
    fn name(&self) -> &str {
        "subscriber"
    }
}

/// A subscriber that logs every lifecycle event.
#[derive(Debug, Clone, Default)]
pub struct LoggingSubscriber;

#[async_trait]
impl AlertSubscriber for LoggingSubscriber {
    async fn on_alert_triggered(&self, alert: &Alert) -> Result<(), HookError> {
        info!(
            "[lifecycle] alert {} triggered ({})",
            alert.id, alert.trigger.kind
        );
        Ok(())
    }

    async fn on_alert_confirmed(&self, alert: &Alert) -> Result<(), HookError> {
        info!(
            "[lifecycle] alert {} confirmed, {} delivery results",
            alert.id,
            alert.delivery_results.len()
        );
        Ok(())
    }

    async fn on_alert_cancelled(&self, alert: &Alert) -> Result<(), HookError> {
        info!("[lifecycle] alert {} cancelled", alert.id);
        Ok(())
    }

    async fn on_messages_sent(
        &self,
        alert_id: &str,
        results: &[MessageResult],
    ) -> Result<(), HookError> {
        let successful = results.iter().filter(|r| r.success).count();
        info!(
            "[lifecycle] alert {}: {}/{} messages delivered",
            alert_id,
            successful,
            results.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}
