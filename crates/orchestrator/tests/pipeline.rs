//! End-to-end pipeline scenarios: trigger through history.

use std::sync::Arc;
use std::time::Duration;

use alert_core::{
    Alert, AlertStatus, AlertStore, Contact, HookError, Location, LocationProvider,
    LocationSource, MemoryAlertStore, MessageResult,
};
use chrono::Utc;
use geolocate::{LocationResolver, ResolverConfig, StaticProvider};
use orchestrator::{
    AlertOrchestrator, AlertSubscriber, ContactDirectory, MessageDispatcher, OrchestratorConfig,
};
use tokio::sync::Mutex;

const SHORT_WINDOW: Duration = Duration::from_millis(100);

fn oslo() -> Location {
    Location {
        latitude: 59.9139,
        longitude: 10.7522,
        address: "203.0.113.9".to_string(),
        city: "Oslo".to_string(),
        country: "Norway".to_string(),
        source: LocationSource::Ip,
        accuracy: 0.8,
        resolved_at: Utc::now(),
    }
}

/// Orchestrator wired for tests: short window, static location, no
/// gateway (record-only delivery), two enabled contacts and one disabled.
async fn test_orchestrator() -> AlertOrchestrator {
    let config = OrchestratorConfig::default().with_confirmation_timeout(SHORT_WINDOW);

    let providers: Vec<Arc<dyn LocationProvider>> = vec![Arc::new(StaticProvider::new(oslo()))];
    let resolver = LocationResolver::new(ResolverConfig::default(), providers);

    let directory = Arc::new(ContactDirectory::new());
    directory
        .upsert_contact(Contact::new("Alice", "+15550001111", "Family", 1))
        .await
        .unwrap();
    directory
        .upsert_contact(Contact::new("Bob", "+15550002222", "Friend", 2))
        .await
        .unwrap();

    AlertOrchestrator::new(
        config,
        resolver,
        MessageDispatcher::new(None),
        directory,
        Arc::new(MemoryAlertStore::new()),
    )
}

async fn wait_for_history(orchestrator: &AlertOrchestrator, count: usize) -> Vec<Alert> {
    for _ in 0..100 {
        let history = orchestrator.history(10).await;
        if history.len() >= count {
            return history;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "alert history never reached {} entries: {:?}",
        count,
        orchestrator.history(10).await.len()
    );
}

#[tokio::test]
async fn test_manual_trigger_then_cancel() {
    let orchestrator = test_orchestrator().await;

    assert!(orchestrator.trigger_manual().await);
    assert!(orchestrator.is_awaiting_confirmation().await);
    assert!(orchestrator.cancel().await);

    let history = wait_for_history(&orchestrator, 1).await;
    let last = &history[0];
    assert_eq!(last.status, AlertStatus::Cancelled);
    assert_eq!(last.status.as_str(), "cancelled");
    assert!(!last.confirmed);
    assert!(last.delivery_results.is_empty());

    let status = orchestrator.status().await;
    assert_eq!(status.triggered, 1);
    assert_eq!(status.cancelled, 1);
    assert_eq!(status.confirmed, 0);
    assert!(status.current_alert_id.is_none());
}

#[tokio::test]
async fn test_voice_trigger_times_out_and_dispatches() {
    let orchestrator = test_orchestrator().await;

    assert!(orchestrator.trigger_voice("help me", 0.9).await);

    // No confirm, no cancel: the window elapses and auto-confirms.
    let history = wait_for_history(&orchestrator, 1).await;
    let last = &history[0];

    assert_eq!(last.status, AlertStatus::Confirmed);
    assert_eq!(last.status.as_str(), "confirmed");
    assert!(last.confirmed);
    assert_eq!(last.trigger.payload, "help me");

    // One result per enabled contact; the record-only fallback makes
    // each a success, a real gateway failure would surface as
    // success=false with a non-empty error.
    assert_eq!(last.delivery_results.len(), 2);
    for result in &last.delivery_results {
        assert!(result.success || result.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    // The resolved location made it onto the alert and into the message
    // variables.
    assert_eq!(last.location.as_ref().unwrap().city, "Oslo");
}

#[tokio::test]
async fn test_explicit_confirm_dispatches_immediately() {
    let orchestrator = test_orchestrator().await;

    assert!(orchestrator.trigger_manual().await);
    assert!(orchestrator.confirm().await);

    let history = wait_for_history(&orchestrator, 1).await;
    assert_eq!(history[0].status, AlertStatus::Confirmed);
    assert_eq!(history[0].delivery_results.len(), 2);

    let status = orchestrator.status().await;
    assert_eq!(status.confirmed, 1);
    assert_eq!(status.recorded_alerts, 1);
}

#[tokio::test]
async fn test_second_trigger_rejected_while_pending() {
    let orchestrator = test_orchestrator().await;

    assert!(orchestrator.trigger_manual().await);
    assert!(!orchestrator.trigger_manual().await, "machine is busy");

    orchestrator.cancel().await;
    let history = wait_for_history(&orchestrator, 1).await;

    // Only one alert object was ever created.
    assert_eq!(history.len(), 1);
    assert_eq!(orchestrator.status().await.triggered, 1);
}

#[tokio::test]
async fn test_new_trigger_accepted_after_resolution() {
    let orchestrator = test_orchestrator().await;

    assert!(orchestrator.trigger_manual().await);
    orchestrator.cancel().await;
    wait_for_history(&orchestrator, 1).await;

    assert!(orchestrator.trigger_voice("sos", 0.8).await);
    orchestrator.confirm().await;
    let history = wait_for_history(&orchestrator, 2).await;

    // Most recent first.
    assert_eq!(history[0].status, AlertStatus::Confirmed);
    assert_eq!(history[1].status, AlertStatus::Cancelled);
}

#[tokio::test]
async fn test_non_qualifying_inputs_do_not_trigger() {
    let orchestrator = test_orchestrator().await;

    assert!(!orchestrator.trigger_voice("nice weather today", 0.99).await);
    assert!(!orchestrator.trigger_gesture("thumbs_up", 0.99).await);
    assert!(!orchestrator.is_awaiting_confirmation().await);
    assert_eq!(orchestrator.status().await.triggered, 0);

    assert!(orchestrator.trigger_gesture("two_fingers", 0.8).await);
    assert!(orchestrator.is_awaiting_confirmation().await);
}

#[tokio::test]
async fn test_confirm_after_resolution_is_noop() {
    let orchestrator = test_orchestrator().await;

    orchestrator.trigger_manual().await;
    orchestrator.cancel().await;
    wait_for_history(&orchestrator, 1).await;

    // The alert already resolved; a late confirm changes nothing.
    assert!(!orchestrator.confirm().await);
    assert_eq!(orchestrator.history(10).await.len(), 1);
}

/// Records lifecycle notifications.
#[derive(Default)]
struct RecordingSubscriber {
    events: Mutex<Vec<String>>,
}

#[alert_core::async_trait]
impl AlertSubscriber for RecordingSubscriber {
    async fn on_alert_triggered(&self, alert: &Alert) -> Result<(), HookError> {
        self.events
            .lock()
            .await
            .push(format!("triggered:{}", alert.id));
        Ok(())
    }

    async fn on_alert_confirmed(&self, alert: &Alert) -> Result<(), HookError> {
        self.events
            .lock()
            .await
            .push(format!("confirmed:{}", alert.id));
        Ok(())
    }

    async fn on_alert_cancelled(&self, alert: &Alert) -> Result<(), HookError> {
        self.events
            .lock()
            .await
            .push(format!("cancelled:{}", alert.id));
        Ok(())
    }

    async fn on_messages_sent(
        &self,
        alert_id: &str,
        results: &[MessageResult],
    ) -> Result<(), HookError> {
        self.events
            .lock()
            .await
            .push(format!("messages:{}:{}", alert_id, results.len()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// A subscriber that always fails, to prove isolation.
struct ExplodingSubscriber;

#[alert_core::async_trait]
impl AlertSubscriber for ExplodingSubscriber {
    async fn on_alert_triggered(&self, _: &Alert) -> Result<(), HookError> {
        Err(HookError("persistence offline".to_string()))
    }

    async fn on_alert_confirmed(&self, _: &Alert) -> Result<(), HookError> {
        Err(HookError("persistence offline".to_string()))
    }

    fn name(&self) -> &str {
        "exploding"
    }
}

#[tokio::test]
async fn test_subscribers_receive_ordered_lifecycle() {
    let orchestrator = test_orchestrator().await;
    let recorder = Arc::new(RecordingSubscriber::default());

    // The failing subscriber is registered first; the recorder must
    // still see every event.
    orchestrator.subscribe(Arc::new(ExplodingSubscriber)).await;
    orchestrator.subscribe(recorder.clone()).await;

    orchestrator.trigger_manual().await;
    orchestrator.confirm().await;
    wait_for_history(&orchestrator, 1).await;

    let events = recorder.events.lock().await.clone();
    assert_eq!(events.len(), 3);
    assert!(events[0].starts_with("triggered:"));
    assert!(events[1].starts_with("confirmed:"));
    assert!(events[2].starts_with("messages:"));

    // All three events refer to the same alert.
    let id = events[0].split(':').nth(1).unwrap().to_string();
    assert!(events[1].contains(&id));
    assert!(events[2].contains(&id));
    assert!(events[2].ends_with(":2"), "two enabled contacts");
}

#[tokio::test]
async fn test_history_in_durable_store() {
    // Same pipeline but with the SQLite-backed store.
    let db = alert_store::Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    let store = Arc::new(alert_store::SqliteAlertStore::new(db));

    let config = OrchestratorConfig::default().with_confirmation_timeout(SHORT_WINDOW);
    let providers: Vec<Arc<dyn LocationProvider>> = vec![Arc::new(StaticProvider::new(oslo()))];
    let resolver = LocationResolver::new(ResolverConfig::default(), providers);
    let directory = Arc::new(ContactDirectory::new());
    directory
        .upsert_contact(Contact::new("Alice", "+15550001111", "Family", 1))
        .await
        .unwrap();

    let orchestrator = AlertOrchestrator::new(
        config,
        resolver,
        MessageDispatcher::new(None),
        directory,
        store.clone(),
    );

    orchestrator.trigger_manual().await;
    orchestrator.confirm().await;
    let history = wait_for_history(&orchestrator, 1).await;

    assert_eq!(history[0].status, AlertStatus::Confirmed);
    assert_eq!(history[0].delivery_results.len(), 1);
    assert_eq!(store.count().await.unwrap(), 1);
}
