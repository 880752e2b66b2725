//! Twilio SMS delivery gateway.
//!
//! This crate provides [`TwilioGateway`], the primary
//! [`DeliveryChannel`](alert_core::DeliveryChannel) implementation: a
//! thin client for the Twilio Messages API with basic auth, a bounded
//! request timeout, and typed responses.
//!
//! Absence of credentials is an expected, valid condition - callers
//! check [`TwilioGateway::from_env`] and run with the local record-only
//! fallback channel when it fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use sms_gateway::TwilioGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = TwilioGateway::from_env()?;
//! let message = gateway.send_sms("+15559998888", "EMERGENCY ALERT").await?;
//! println!("sent: {} ({})", message.sid, message.status);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{TwilioGateway, TwilioMessage};
pub use config::TwilioConfig;
pub use error::GatewayError;
