//! Error types for the SMS gateway.

use thiserror::Error;

/// Errors that can occur when talking to the Twilio API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("Twilio API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Invalid or missing configuration.
    ///
    /// Missing credentials are an expected deployment state, not a
    /// crash: callers fall back to the local record-only channel.
    #[error("invalid configuration: {0}")]
    Config(String),
}
