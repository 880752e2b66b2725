//! The alert orchestrator: wires the state machine to location lookup,
//! dispatch, history, and lifecycle subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alert_core::{
    Alert, AlertStatus, AlertStore, HookError, MemoryAlertStore, MessageResult, MessageTemplate,
    TriggerEvent,
};
use async_trait::async_trait;
use chrono::Utc;
use geolocate::{LocationResolver, ResolverConfig};
use indexmap::IndexMap;
use serde::Serialize;
use sms_gateway::TwilioGateway;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::directory::ContactDirectory;
use crate::dispatch::MessageDispatcher;
use crate::error::OrchestratorError;
use crate::events::AlertSubscriber;
use crate::trigger::{TriggerConfig, TriggerObserver, TriggerStateMachine};

/// Snapshot of the alert system for health/status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// Id of the alert currently in its confirmation window, if any.
    pub current_alert_id: Option<String>,
    /// Status of the current alert, if any.
    pub current_alert_status: Option<AlertStatus>,
    /// Whether a confirmation window is open right now.
    pub awaiting_confirmation: bool,
    /// Total accepted triggers.
    pub triggered: u64,
    /// Total confirmed alerts (explicit and timed out).
    pub confirmed: u64,
    /// Total cancelled alerts.
    pub cancelled: u64,
    /// Alerts recorded in history.
    pub recorded_alerts: u64,
    /// Configured contacts.
    pub contacts_configured: usize,
    /// Enabled contacts.
    pub contacts_enabled: usize,
}

#[derive(Debug, Default)]
struct Counters {
    triggered: AtomicU64,
    confirmed: AtomicU64,
    cancelled: AtomicU64,
}

/// The resolution side of the pipeline, shared with the state machine's
/// countdown task. The only writer path for the current alert and the
/// history append.
struct AlertPipeline {
    config: OrchestratorConfig,
    resolver: LocationResolver,
    dispatcher: MessageDispatcher,
    directory: Arc<ContactDirectory>,
    store: Arc<dyn AlertStore>,
    subscribers: RwLock<Vec<Arc<dyn AlertSubscriber>>>,
    current: Mutex<Option<Alert>>,
    counters: Counters,
}

impl AlertPipeline {
    /// Build the message variables for an alert.
    fn alert_variables(alert: &Alert) -> IndexMap<String, String> {
        let mut variables = IndexMap::new();
        variables.insert(
            "timestamp".to_string(),
            Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        variables.insert(
            "trigger_type".to_string(),
            alert.trigger.kind.as_str().to_string(),
        );

        match &alert.location {
            Some(location) => {
                variables.insert("location".to_string(), location.summary());
                variables.insert("coordinates".to_string(), location.coordinates());
            }
            None => {
                variables.insert("location".to_string(), "Location unknown".to_string());
                variables.insert("coordinates".to_string(), "N/A".to_string());
            }
        }

        variables
    }

    /// Shared resolution path for explicit confirmation and timeout.
    async fn complete_confirmed(&self, auto_confirmed: bool) -> Result<(), HookError> {
        let Some(mut alert) = self.current.lock().await.take() else {
            warn!("confirmation fired with no pending alert, ignoring");
            return Ok(());
        };

        if auto_confirmed {
            warn!("alert {} auto-confirmed by timeout", alert.id);
        } else {
            warn!("alert {} confirmed, starting emergency protocol", alert.id);
        }

        // Best-effort location; None is data, not an error.
        alert.location = self.resolver.resolve().await;
        match &alert.location {
            Some(location) => info!("alert location: {}", location.summary()),
            None => warn!("could not determine location, proceeding without it"),
        }

        let template = match self
            .directory
            .template(&self.config.emergency_template_id)
            .await
        {
            Some(template) => template,
            None => {
                warn!(
                    "template {} not found, using built-in fallback",
                    self.config.emergency_template_id
                );
                MessageTemplate::fallback_emergency()
            }
        };

        let variables = Self::alert_variables(&alert);
        let contacts = self.directory.list(true).await;
        let results = self
            .dispatcher
            .dispatch(&template, &variables, &contacts)
            .await;

        alert.confirmed = true;
        alert.status = AlertStatus::Confirmed;
        alert.delivery_results = results.clone();
        alert.updated_at = Utc::now();
        self.counters.confirmed.fetch_add(1, Ordering::Relaxed);

        self.record(&alert).await;
        self.notify_confirmed(&alert).await;
        self.notify_messages_sent(&alert.id, &results).await;

        warn!("emergency alert protocol completed for {}", alert.id);
        Ok(())
    }

    async fn record(&self, alert: &Alert) {
        if let Err(e) = self.store.append(alert).await {
            warn!("failed to record alert {} in history: {}", alert.id, e);
        }
    }

    async fn notify_triggered(&self, alert: &Alert) {
        for subscriber in self.subscribers.read().await.iter() {
            if let Err(e) = subscriber.on_alert_triggered(alert).await {
                warn!("subscriber {} failed on alert_triggered: {}", subscriber.name(), e);
            }
        }
    }

    async fn notify_confirmed(&self, alert: &Alert) {
        for subscriber in self.subscribers.read().await.iter() {
            if let Err(e) = subscriber.on_alert_confirmed(alert).await {
                warn!("subscriber {} failed on alert_confirmed: {}", subscriber.name(), e);
            }
        }
    }

    async fn notify_cancelled(&self, alert: &Alert) {
        for subscriber in self.subscribers.read().await.iter() {
            if let Err(e) = subscriber.on_alert_cancelled(alert).await {
                warn!("subscriber {} failed on alert_cancelled: {}", subscriber.name(), e);
            }
        }
    }

    async fn notify_messages_sent(&self, alert_id: &str, results: &[MessageResult]) {
        for subscriber in self.subscribers.read().await.iter() {
            if let Err(e) = subscriber.on_messages_sent(alert_id, results).await {
                warn!("subscriber {} failed on messages_sent: {}", subscriber.name(), e);
            }
        }
    }
}

#[async_trait]
impl TriggerObserver for AlertPipeline {
    async fn on_triggered(&self, event: &TriggerEvent) -> Result<(), HookError> {
        let alert = Alert::pending(event.clone());
        warn!(
            "emergency alert {} created ({}), awaiting confirmation",
            alert.id, event.kind
        );

        self.counters.triggered.fetch_add(1, Ordering::Relaxed);
        *self.current.lock().await = Some(alert.clone());
        self.notify_triggered(&alert).await;
        Ok(())
    }

    async fn on_confirmed(&self, _event: &TriggerEvent) -> Result<(), HookError> {
        self.complete_confirmed(false).await
    }

    async fn on_timed_out(&self, _event: &TriggerEvent) -> Result<(), HookError> {
        self.complete_confirmed(true).await
    }

    async fn on_cancelled(&self, _event: &TriggerEvent) -> Result<(), HookError> {
        let Some(mut alert) = self.current.lock().await.take() else {
            warn!("cancellation fired with no pending alert, ignoring");
            return Ok(());
        };

        alert.status = AlertStatus::Cancelled;
        alert.updated_at = Utc::now();
        self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        info!("alert {} cancelled before dispatch", alert.id);

        self.record(&alert).await;
        self.notify_cancelled(&alert).await;
        Ok(())
    }
}

/// The only component allowed to drive the alert lifecycle.
///
/// Owns the [`TriggerStateMachine`] and binds its resolution callbacks to
/// the location/dispatch/history pipeline and to registered
/// [`AlertSubscriber`]s. Trigger entry points are non-blocking: the
/// confirmation countdown and the subsequent pipeline run on a spawned
/// task.
pub struct AlertOrchestrator {
    machine: TriggerStateMachine,
    pipeline: Arc<AlertPipeline>,
    config: OrchestratorConfig,
}

impl AlertOrchestrator {
    /// Create an orchestrator from its collaborators.
    pub fn new(
        config: OrchestratorConfig,
        resolver: LocationResolver,
        dispatcher: MessageDispatcher,
        directory: Arc<ContactDirectory>,
        store: Arc<dyn AlertStore>,
    ) -> Self {
        let pipeline = Arc::new(AlertPipeline {
            config: config.clone(),
            resolver,
            dispatcher,
            directory,
            store,
            subscribers: RwLock::new(Vec::new()),
            current: Mutex::new(None),
            counters: Counters::default(),
        });

        let machine = TriggerStateMachine::new(
            TriggerConfig {
                confirmation_timeout: config.confirmation_timeout,
            },
            pipeline.clone(),
        );

        Self {
            machine,
            pipeline,
            config,
        }
    }

    /// Create an orchestrator from environment variables.
    ///
    /// Wires the standard provider chain, the Twilio gateway when
    /// credentials are present (record-only fallback otherwise), and a
    /// SQLite-backed directory and history when `ALERT_DATABASE_URL` is
    /// set (in-memory otherwise).
    pub async fn from_env() -> Result<Self, OrchestratorError> {
        let config = OrchestratorConfig::from_env();

        let resolver = LocationResolver::with_default_providers(ResolverConfig::from_env())
            .map_err(|e| OrchestratorError::Configuration(e.to_string()))?;

        let primary: Option<Arc<dyn alert_core::DeliveryChannel>> = match TwilioGateway::from_env()
        {
            Ok(gateway) => {
                info!("Twilio gateway configured");
                Some(Arc::new(gateway))
            }
            Err(e) => {
                warn!("no SMS gateway configured ({}), deliveries will be recorded locally", e);
                None
            }
        };
        let dispatcher =
            MessageDispatcher::new(primary).with_delivery_timeout(config.delivery_timeout);

        let (directory, store): (Arc<ContactDirectory>, Arc<dyn AlertStore>) =
            match std::env::var("ALERT_DATABASE_URL") {
                Ok(url) => {
                    let db = alert_store::Database::connect(&url)
                        .await
                        .map_err(|e| OrchestratorError::Database(e.to_string()))?;
                    db.migrate()
                        .await
                        .map_err(|e| OrchestratorError::Database(e.to_string()))?;
                    (
                        Arc::new(ContactDirectory::with_database(db.clone()).await),
                        Arc::new(alert_store::SqliteAlertStore::new(db)),
                    )
                }
                Err(_) => {
                    debug!("ALERT_DATABASE_URL not set, using in-memory configuration");
                    (
                        Arc::new(ContactDirectory::new()),
                        Arc::new(MemoryAlertStore::new()),
                    )
                }
            };

        Ok(Self::new(config, resolver, dispatcher, directory, store))
    }

    /// Register a lifecycle subscriber.
    pub async fn subscribe(&self, subscriber: Arc<dyn AlertSubscriber>) {
        self.pipeline.subscribers.write().await.push(subscriber);
    }

    /// The contact directory.
    pub fn directory(&self) -> &Arc<ContactDirectory> {
        &self.pipeline.directory
    }

    /// Trigger an emergency from a recognized utterance.
    ///
    /// Returns `false` when the text contains no qualifying keyword or a
    /// confirmation window is already open.
    pub async fn trigger_voice(&self, text: &str, confidence: f64) -> bool {
        if !self.config.matches_keyword(text) {
            debug!("utterance contains no emergency keyword: {:?}", text);
            return false;
        }

        warn!(
            "voice emergency detected: {:?} (confidence {:.2})",
            text, confidence
        );
        self.machine
            .trigger(TriggerEvent::voice(text, confidence))
            .await
    }

    /// Trigger an emergency from a classified gesture.
    ///
    /// Returns `false` when the gesture is not the qualifying emergency
    /// gesture or a confirmation window is already open.
    pub async fn trigger_gesture(&self, gesture: &str, confidence: f64) -> bool {
        if gesture != self.config.emergency_gesture {
            debug!("gesture {:?} is not the emergency gesture", gesture);
            return false;
        }

        warn!(
            "gesture emergency detected: {:?} (confidence {:.2})",
            gesture, confidence
        );
        self.machine
            .trigger(TriggerEvent::gesture(gesture, confidence))
            .await
    }

    /// Trigger an emergency from the manual button.
    pub async fn trigger_manual(&self) -> bool {
        warn!("manual emergency triggered");
        self.machine.trigger(TriggerEvent::manual()).await
    }

    /// Confirm the pending emergency.
    pub async fn confirm(&self) -> bool {
        self.machine.confirm().await
    }

    /// Cancel the pending emergency.
    pub async fn cancel(&self) -> bool {
        self.machine.cancel().await
    }

    /// Whether a confirmation window is open right now.
    pub async fn is_awaiting_confirmation(&self) -> bool {
        self.machine.is_awaiting().await
    }

    /// Current system status for health endpoints.
    pub async fn status(&self) -> SystemStatus {
        let current = self.pipeline.current.lock().await.clone();
        let recorded_alerts = self.pipeline.store.count().await.unwrap_or_else(|e| {
            warn!("failed to count recorded alerts: {}", e);
            0
        });

        SystemStatus {
            current_alert_id: current.as_ref().map(|a| a.id.clone()),
            current_alert_status: current.as_ref().map(|a| a.status),
            awaiting_confirmation: self.machine.is_awaiting().await,
            triggered: self.pipeline.counters.triggered.load(Ordering::Relaxed),
            confirmed: self.pipeline.counters.confirmed.load(Ordering::Relaxed),
            cancelled: self.pipeline.counters.cancelled.load(Ordering::Relaxed),
            recorded_alerts,
            contacts_configured: self.pipeline.directory.len().await,
            contacts_enabled: self.pipeline.directory.enabled_count().await,
        }
    }

    /// Most recent alerts first, at most `limit`. Store failures are
    /// logged and surface as an empty list.
    pub async fn history(&self, limit: usize) -> Vec<Alert> {
        match self.pipeline.store.recent(limit).await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!("failed to load alert history: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_variables_with_location() {
        let mut alert = Alert::pending(TriggerEvent::voice("help", 0.9));
        alert.location = Some(alert_core::Location {
            latitude: 59.9139,
            longitude: 10.7522,
            address: "203.0.113.9".to_string(),
            city: "Oslo".to_string(),
            country: "Norway".to_string(),
            source: alert_core::LocationSource::Ip,
            accuracy: 0.8,
            resolved_at: Utc::now(),
        });

        let variables = AlertPipeline::alert_variables(&alert);
        assert_eq!(variables.get("location").unwrap(), "Oslo, Norway");
        assert_eq!(variables.get("coordinates").unwrap(), "59.9139, 10.7522");
        assert_eq!(variables.get("trigger_type").unwrap(), "voice");
        assert!(variables.contains_key("timestamp"));
    }

    #[test]
    fn test_alert_variables_without_location() {
        let alert = Alert::pending(TriggerEvent::manual());
        let variables = AlertPipeline::alert_variables(&alert);
        assert_eq!(variables.get("location").unwrap(), "Location unknown");
        assert_eq!(variables.get("coordinates").unwrap(), "N/A");
        assert_eq!(variables.get("trigger_type").unwrap(), "manual");
    }
}
