//! End-to-end alert pipeline example.
//!
//! Wires the orchestrator from the environment, registers a logging
//! subscriber, fires a manual trigger, and lets the confirmation window
//! elapse so the full dispatch path runs.
//!
//! Run with: cargo run -p orchestrator --example alert_pipeline
//!
//! Configuration via .env file or environment variables:
//!   TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN / TWILIO_PHONE_NUMBER
//!                                  - SMS gateway credentials (optional;
//!                                    without them messages are recorded
//!                                    locally)
//!   ALERT_DATABASE_URL             - SQLite URL for durable contacts and
//!                                    history (optional)
//!   ALERT_CONFIRMATION_TIMEOUT_SECS - confirmation window (default: 10)

use std::sync::Arc;
use std::time::Duration;

use orchestrator::{AlertOrchestrator, Contact, LoggingSubscriber};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let orchestrator = AlertOrchestrator::from_env().await?;
    orchestrator.subscribe(Arc::new(LoggingSubscriber)).await;

    // Seed a demo contact so the dispatch has somewhere to go.
    orchestrator
        .directory()
        .upsert_contact(Contact::new("Demo Contact", "+15550001111", "Family", 1))
        .await?;

    let status = orchestrator.status().await;
    info!(
        "alert system ready: {} contacts configured, {} enabled",
        status.contacts_configured, status.contacts_enabled
    );

    warn!("firing manual emergency trigger");
    let accepted = orchestrator.trigger_manual().await;
    info!("trigger accepted: {}", accepted);

    // Do nothing: the confirmation window elapses and auto-confirms,
    // which is the fail-safe default for an unanswered emergency.
    let window = orchestrator.status().await;
    info!(
        "awaiting confirmation: {} (current alert: {:?})",
        window.awaiting_confirmation, window.current_alert_id
    );
    tokio::time::sleep(Duration::from_secs(12)).await;

    for alert in orchestrator.history(5).await {
        info!(
            "history: {} [{}] {} delivery results",
            alert.id,
            alert.status,
            alert.delivery_results.len()
        );
    }

    Ok(())
}
