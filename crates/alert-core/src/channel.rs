//! The delivery channel trait.

use async_trait::async_trait;

use crate::error::DeliveryError;

/// What a channel reports back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id, or a synthetic id for local channels.
    pub message_id: String,
    /// Provider-reported delivery status (e.g. "queued", "sent", "recorded").
    pub status: String,
}

/// A transport that can deliver one rendered message to one phone number.
///
/// Implementations range from an external SMS gateway to the local
/// record-only fallback. This trait is object-safe and used as
/// `Arc<dyn DeliveryChannel>`.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Deliver `body` to `phone`.
    async fn deliver(&self, phone: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError>;

    /// Human-readable channel name for logs.
    fn name(&self) -> &str;
}
