//! The trigger confirmation state machine.
//!
//! Converts one [`TriggerEvent`] into exactly one resolution among
//! confirmed, cancelled, or timed-out-confirmed, guaranteeing at most one
//! active confirmation window at a time.
//!
//! The window is a spawned task racing a signal channel against a timer
//! with `tokio::select!` - there is no polling loop and no shared mutable
//! flags. `confirm()` and `cancel()` only push a signal; whichever of
//! {confirm, cancel, timeout} arrives first wins and the rest are no-ops.
//!
//! An unanswered window resolves as [`AlertState::TimedOutConfirmed`] and
//! proceeds with the alert: silence more often means incapacitation than
//! false alarm, so the fail-safe default is to send.

use std::sync::Arc;
use std::time::Duration;

use alert_core::{HookError, TriggerEvent};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Default confirmation window.
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(10);

/// States of the confirmation state machine.
///
/// `Idle` is both initial and terminal-reset; the three resolution states
/// are terminal for one alert instance, after which the machine resets to
/// `Idle` so a new trigger can be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    AwaitingConfirmation,
    Confirmed,
    Cancelled,
    TimedOutConfirmed,
}

/// A user signal into an open confirmation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Confirm,
    Cancel,
}

/// Observer invoked at state-machine lifecycle points.
///
/// Exactly one of the three resolution methods runs per accepted trigger,
/// awaited to completion before the machine resets to `Idle`. Errors are
/// logged by the machine and never propagate into the countdown task.
#[async_trait]
pub trait TriggerObserver: Send + Sync {
    /// A trigger was accepted and a confirmation window opened.
    async fn on_triggered(&self, event: &TriggerEvent) -> Result<(), HookError>;

    /// The user explicitly confirmed the emergency.
    async fn on_confirmed(&self, event: &TriggerEvent) -> Result<(), HookError>;

    /// The user cancelled the emergency.
    async fn on_cancelled(&self, event: &TriggerEvent) -> Result<(), HookError>;

    /// The window elapsed with no answer; the emergency proceeds.
    async fn on_timed_out(&self, event: &TriggerEvent) -> Result<(), HookError>;
}

/// Configuration for the state machine.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// How long the window stays open before auto-confirming.
    pub confirmation_timeout: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

struct Inner {
    state: AlertState,
    /// Present only while a window is open.
    signal_tx: Option<mpsc::Sender<Signal>>,
}

/// The trigger confirmation state machine.
pub struct TriggerStateMachine {
    inner: Arc<Mutex<Inner>>,
    config: TriggerConfig,
    observer: Arc<dyn TriggerObserver>,
}

impl TriggerStateMachine {
    /// Create a machine delivering lifecycle callbacks to `observer`.
    pub fn new(config: TriggerConfig, observer: Arc<dyn TriggerObserver>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: AlertState::Idle,
                signal_tx: None,
            })),
            config,
            observer,
        }
    }

    /// Current machine state.
    pub async fn state(&self) -> AlertState {
        self.inner.lock().await.state
    }

    /// Whether a confirmation window is currently open.
    pub async fn is_awaiting(&self) -> bool {
        self.state().await == AlertState::AwaitingConfirmation
    }

    /// Submit a trigger event.
    ///
    /// Returns `false` without touching the active window when the
    /// machine is not `Idle` - a new emergency cannot interrupt one
    /// already awaiting confirmation. On acceptance the confirmation
    /// window opens before this method returns, so an immediate
    /// `confirm()`/`cancel()` is always observed.
    pub async fn trigger(&self, event: TriggerEvent) -> bool {
        // Capacity 2: confirm and cancel can both land in the same tick;
        // the first one received wins.
        let (tx, rx) = mpsc::channel(2);

        {
            let mut inner = self.inner.lock().await;
            if inner.state != AlertState::Idle {
                warn!(
                    "trigger rejected: alert already in progress (state: {:?})",
                    inner.state
                );
                return false;
            }
            inner.state = AlertState::AwaitingConfirmation;
            inner.signal_tx = Some(tx);
        }

        warn!(
            "emergency trigger accepted ({}): {:?} (confidence {:.2}), window {:?}",
            event.kind, event.payload, event.confidence, self.config.confirmation_timeout
        );

        if let Err(e) = self.observer.on_triggered(&event).await {
            warn!("triggered hook failed: {}", e);
        }

        let inner = Arc::clone(&self.inner);
        let observer = Arc::clone(&self.observer);
        let window = self.config.confirmation_timeout;
        tokio::spawn(async move {
            Self::countdown(inner, observer, event, rx, window).await;
        });

        true
    }

    /// Confirm the pending emergency. No-op with a warning when no window
    /// is open or the window has already resolved.
    pub async fn confirm(&self) -> bool {
        self.send_signal(Signal::Confirm).await
    }

    /// Cancel the pending emergency. Safe to call from any task at any
    /// time; losing the race to a resolution is a no-op, not an error.
    pub async fn cancel(&self) -> bool {
        self.send_signal(Signal::Cancel).await
    }

    async fn send_signal(&self, signal: Signal) -> bool {
        let inner = self.inner.lock().await;
        if inner.state != AlertState::AwaitingConfirmation {
            warn!(
                "no confirmation window open, {:?} ignored (state: {:?})",
                signal, inner.state
            );
            return false;
        }

        match &inner.signal_tx {
            Some(tx) => match tx.try_send(signal) {
                Ok(()) => {
                    info!("emergency {:?} signal accepted", signal);
                    true
                }
                Err(_) => {
                    debug!("window already resolving, {:?} ignored", signal);
                    false
                }
            },
            None => false,
        }
    }

    /// The confirmation window task: first of {signal, timeout} wins.
    async fn countdown(
        inner: Arc<Mutex<Inner>>,
        observer: Arc<dyn TriggerObserver>,
        event: TriggerEvent,
        mut rx: mpsc::Receiver<Signal>,
        window: Duration,
    ) {
        let resolved = tokio::select! {
            signal = rx.recv() => match signal {
                Some(Signal::Confirm) => AlertState::Confirmed,
                Some(Signal::Cancel) => AlertState::Cancelled,
                // All senders dropped without a signal; treat as cancel.
                None => AlertState::Cancelled,
            },
            _ = tokio::time::sleep(window) => AlertState::TimedOutConfirmed,
        };

        {
            let mut guard = inner.lock().await;
            guard.state = resolved;
            guard.signal_tx = None;
        }

        let hook_result = match resolved {
            AlertState::Confirmed => {
                warn!("emergency CONFIRMED by user");
                observer.on_confirmed(&event).await
            }
            AlertState::Cancelled => {
                info!("emergency cancelled by user");
                observer.on_cancelled(&event).await
            }
            AlertState::TimedOutConfirmed => {
                warn!(
                    "confirmation window elapsed after {:?}, proceeding automatically",
                    window
                );
                observer.on_timed_out(&event).await
            }
            // Unreachable: the select above only yields resolutions.
            other => {
                warn!("unexpected resolution state {:?}", other);
                Ok(())
            }
        };

        if let Err(e) = hook_result {
            warn!("resolution hook failed: {}", e);
        }

        let mut guard = inner.lock().await;
        guard.state = AlertState::Idle;
        debug!("state machine reset to idle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex as AsyncMutex;

    /// Records every observer invocation in order.
    #[derive(Default)]
    struct RecordingObserver {
        calls: AsyncMutex<Vec<String>>,
    }

    impl RecordingObserver {
        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }

        async fn wait_for_resolution(&self) -> Vec<String> {
            for _ in 0..100 {
                let calls = self.calls().await;
                if calls.len() >= 2 {
                    return calls;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("state machine never resolved: {:?}", self.calls().await);
        }
    }

    #[async_trait]
    impl TriggerObserver for RecordingObserver {
        async fn on_triggered(&self, _event: &TriggerEvent) -> Result<(), HookError> {
            self.calls.lock().await.push("triggered".to_string());
            Ok(())
        }

        async fn on_confirmed(&self, _event: &TriggerEvent) -> Result<(), HookError> {
            self.calls.lock().await.push("confirmed".to_string());
            Ok(())
        }

        async fn on_cancelled(&self, _event: &TriggerEvent) -> Result<(), HookError> {
            self.calls.lock().await.push("cancelled".to_string());
            Ok(())
        }

        async fn on_timed_out(&self, _event: &TriggerEvent) -> Result<(), HookError> {
            self.calls.lock().await.push("timed_out".to_string());
            Ok(())
        }
    }

    fn machine(
        window: Duration,
    ) -> (TriggerStateMachine, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let machine = TriggerStateMachine::new(
            TriggerConfig {
                confirmation_timeout: window,
            },
            observer.clone(),
        );
        (machine, observer)
    }

    async fn wait_for_idle(machine: &TriggerStateMachine) {
        for _ in 0..100 {
            if machine.state().await == AlertState::Idle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("machine never returned to idle");
    }

    #[tokio::test]
    async fn test_trigger_opens_window() {
        let (machine, observer) = machine(Duration::from_secs(5));
        assert_eq!(machine.state().await, AlertState::Idle);

        assert!(machine.trigger(TriggerEvent::manual()).await);
        assert!(machine.is_awaiting().await);
        assert_eq!(observer.calls().await, vec!["triggered"]);
    }

    #[tokio::test]
    async fn test_second_trigger_rejected_while_pending() {
        let (machine, observer) = machine(Duration::from_secs(5));

        assert!(machine.trigger(TriggerEvent::manual()).await);
        assert!(!machine.trigger(TriggerEvent::manual()).await);

        // Only one window was opened.
        assert_eq!(observer.calls().await, vec!["triggered"]);
    }

    #[tokio::test]
    async fn test_confirm_resolves_confirmed() {
        let (machine, observer) = machine(Duration::from_secs(5));

        machine.trigger(TriggerEvent::voice("help", 0.9)).await;
        assert!(machine.confirm().await);

        let calls = observer.wait_for_resolution().await;
        assert_eq!(calls, vec!["triggered", "confirmed"]);
        wait_for_idle(&machine).await;
    }

    #[tokio::test]
    async fn test_cancel_resolves_cancelled() {
        let (machine, observer) = machine(Duration::from_secs(5));

        machine.trigger(TriggerEvent::manual()).await;
        assert!(machine.cancel().await);

        let calls = observer.wait_for_resolution().await;
        assert_eq!(calls, vec!["triggered", "cancelled"]);
        wait_for_idle(&machine).await;
    }

    #[tokio::test]
    async fn test_timeout_resolves_timed_out_confirmed() {
        let (machine, observer) = machine(Duration::from_millis(50));

        machine.trigger(TriggerEvent::voice("help me", 0.9)).await;

        let calls = observer.wait_for_resolution().await;
        assert_eq!(calls, vec!["triggered", "timed_out"]);
        wait_for_idle(&machine).await;
    }

    #[tokio::test]
    async fn test_first_signal_wins() {
        let (machine, observer) = machine(Duration::from_secs(5));

        machine.trigger(TriggerEvent::manual()).await;
        machine.confirm().await;
        machine.cancel().await;

        let calls = observer.wait_for_resolution().await;
        assert_eq!(calls, vec!["triggered", "confirmed"]);
    }

    #[tokio::test]
    async fn test_confirm_while_idle_is_noop() {
        let (machine, observer) = machine(Duration::from_secs(5));

        assert!(!machine.confirm().await);
        assert!(!machine.cancel().await);
        assert_eq!(machine.state().await, AlertState::Idle);
        assert!(observer.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_machine_reusable_after_resolution() {
        let (machine, observer) = machine(Duration::from_secs(5));

        machine.trigger(TriggerEvent::manual()).await;
        machine.cancel().await;
        observer.wait_for_resolution().await;
        wait_for_idle(&machine).await;

        // A fresh trigger is accepted after reset.
        assert!(machine.trigger(TriggerEvent::manual()).await);
        assert!(machine.is_awaiting().await);
    }

    /// A failing observer must not wedge the machine.
    struct FailingObserver;

    #[async_trait]
    impl TriggerObserver for FailingObserver {
        async fn on_triggered(&self, _: &TriggerEvent) -> Result<(), HookError> {
            Err(HookError("triggered boom".to_string()))
        }
        async fn on_confirmed(&self, _: &TriggerEvent) -> Result<(), HookError> {
            Err(HookError("confirmed boom".to_string()))
        }
        async fn on_cancelled(&self, _: &TriggerEvent) -> Result<(), HookError> {
            Err(HookError("cancelled boom".to_string()))
        }
        async fn on_timed_out(&self, _: &TriggerEvent) -> Result<(), HookError> {
            Err(HookError("timed out boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_observer_errors_do_not_wedge_machine() {
        let machine = TriggerStateMachine::new(
            TriggerConfig {
                confirmation_timeout: Duration::from_secs(5),
            },
            Arc::new(FailingObserver),
        );

        assert!(machine.trigger(TriggerEvent::manual()).await);
        machine.confirm().await;
        wait_for_idle(&machine).await;

        assert!(machine.trigger(TriggerEvent::manual()).await);
    }
}
