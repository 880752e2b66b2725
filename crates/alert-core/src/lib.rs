//! Core traits and types for the emergency alert pipeline.
//!
//! This crate provides the shared interface between the orchestrator and
//! its pluggable collaborators. It defines:
//!
//! - [`LocationProvider`] - the trait every location lookup service implements
//! - [`DeliveryChannel`] - the trait every message transport implements
//! - [`AlertStore`] - the alert history repository, with an in-memory
//!   implementation for tests and standalone use
//! - [`TriggerEvent`], [`Location`], [`Contact`], [`MessageTemplate`],
//!   [`MessageResult`], [`Alert`] - the data types that flow through the
//!   pipeline
//! - [`render_template`] - `{variable}` placeholder substitution
//!
//! # Example
//!
//! ```rust
//! use alert_core::{async_trait, DeliveryChannel, DeliveryError, DeliveryReceipt};
//!
//! struct StdoutChannel;
//!
//! #[async_trait]
//! impl DeliveryChannel for StdoutChannel {
//!     async fn deliver(&self, phone: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
//!         println!("-> {}: {}", phone, body);
//!         Ok(DeliveryReceipt {
//!             message_id: "stdout-1".to_string(),
//!             status: "recorded".to_string(),
//!         })
//!     }
//!
//!     fn name(&self) -> &str {
//!         "stdout"
//!     }
//! }
//! ```

mod channel;
mod error;
mod provider;
mod render;
mod store;
mod types;

pub use channel::{DeliveryChannel, DeliveryReceipt};
pub use error::{DeliveryError, HookError, LocationError, StoreError};
pub use provider::LocationProvider;
pub use render::render_template;
pub use store::{AlertStore, MemoryAlertStore};
pub use types::{
    Alert, AlertStatus, Contact, Location, LocationSource, MessageResult, MessageTemplate,
    TriggerEvent, TriggerKind,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export the ordered map used for template variables
pub use indexmap::IndexMap;
