//! Emergency alert orchestration.
//!
//! This crate provides the [`AlertOrchestrator`], which turns a raw
//! trigger signal (voice keyword, hand gesture, manual button) into a
//! confirmed, dispatched, auditable emergency alert.
//!
//! # Architecture
//!
//! ```text
//! trigger_voice / trigger_gesture / trigger_manual
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ALERT ORCHESTRATOR                        │
//! │                                                             │
//! │  1. TriggerStateMachine opens a confirmation window         │
//! │     (confirm / cancel / timeout race, first one wins;       │
//! │      an unanswered window auto-confirms)                    │
//! │         ↓                                                   │
//! │  2. On confirmation: LocationResolver (cache → provider     │
//! │     chain, best effort, may be unknown)                     │
//! │         ↓                                                   │
//! │  3. MessageDispatcher fans out to every enabled contact     │
//! │     (primary gateway with record-only fallback)             │
//! │         ↓                                                   │
//! │  4. Alert appended to history (AlertStore)                  │
//! │         ↓                                                   │
//! │  5. AlertSubscriber hooks notified, each isolated           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one alert is in its confirmation window at any instant; a
//! trigger submitted while one is pending returns `false` and changes
//! nothing.
//!
//! # Example
//!
//! ```rust,no_run
//! use orchestrator::AlertOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = AlertOrchestrator::from_env().await?;
//!
//!     let accepted = orchestrator.trigger_voice("help me", 0.9).await;
//!     println!("trigger accepted: {}", accepted);
//!
//!     // The user changes their mind inside the confirmation window.
//!     orchestrator.cancel().await;
//!     Ok(())
//! }
//! ```

mod config;
mod directory;
mod dispatch;
mod error;
mod events;
mod orchestrator;
mod trigger;

// Public exports
pub use config::OrchestratorConfig;
pub use directory::ContactDirectory;
pub use dispatch::{MessageDispatcher, RecordOnlyChannel};
pub use error::OrchestratorError;
pub use events::{AlertSubscriber, LoggingSubscriber};
pub use orchestrator::{AlertOrchestrator, SystemStatus};
pub use trigger::{AlertState, TriggerConfig, TriggerObserver, TriggerStateMachine};

// Re-export commonly used types from dependencies
pub use alert_core::{
    Alert, AlertStatus, AlertStore, Contact, DeliveryChannel, Location, MemoryAlertStore,
    MessageResult, MessageTemplate, TriggerEvent, TriggerKind,
};
pub use geolocate::{LocationResolver, ResolverConfig};
pub use sms_gateway::{TwilioConfig, TwilioGateway};
