//! Shared error types for the alert pipeline.

use thiserror::Error;

/// Errors that can occur while looking up the user's location.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The HTTP request to the provider failed.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider responded, but the payload could not be parsed.
    #[error("unparseable provider response: {0}")]
    InvalidResponse(String),

    /// The provider reported that it could not produce a location.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while delivering a message to one contact.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The delivery gateway is not configured.
    #[error("gateway not configured: {0}")]
    NotConfigured(String),

    /// The gateway rejected or failed the send.
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Errors surfaced by an [`AlertStore`](crate::AlertStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Error returned by a lifecycle hook.
///
/// Hooks belong to external collaborators; their failures are logged by
/// the caller and never propagate back into the alert lifecycle.
#[derive(Debug, Error)]
#[error("hook failed: {0}")]
pub struct HookError(pub String);

impl HookError {
    /// Wrap any error into a hook error.
    pub fn from_err(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}
