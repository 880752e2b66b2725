//! Error types for orchestrator operations.

use alert_core::StoreError;
use thiserror::Error;

/// Errors that can occur during orchestration.
///
/// The alert lifecycle itself never surfaces these: rejected triggers are
/// a `false` return, lookup and delivery failures degrade to data. These
/// errors cover configuration and directory mutations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A contact failed validation.
    #[error("invalid contact: {0}")]
    InvalidContact(String),

    /// Configuration could not be assembled.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backing database failed.
    #[error("database error: {0}")]
    Database(String),

    /// The alert history store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
