//! Configuration for the alert orchestrator.

use std::env;
use std::time::Duration;

/// Default confirmation window before an unanswered trigger auto-confirms.
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-contact delivery timeout.
const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Default voice keywords that qualify as an emergency trigger.
const DEFAULT_KEYWORDS: [&str; 6] = ["help", "emergency", "sos", "assist", "urgent", "danger"];

/// Default gesture label that qualifies as an emergency trigger.
const DEFAULT_GESTURE: &str = "two_fingers";

/// Template id used for emergency dispatches.
const DEFAULT_TEMPLATE_ID: &str = "emergency_alert";

/// Configuration for the alert orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How long a pending alert waits for confirm/cancel before it
    /// auto-confirms.
    pub confirmation_timeout: Duration,

    /// Timeout applied to each per-contact delivery attempt.
    pub delivery_timeout: Duration,

    /// Voice keywords that qualify an utterance as an emergency trigger
    /// (case-insensitive substring match).
    pub emergency_keywords: Vec<String>,

    /// Gesture label that qualifies as an emergency trigger.
    pub emergency_gesture: String,

    /// Template id rendered for emergency dispatches.
    pub emergency_template_id: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            emergency_keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            emergency_gesture: DEFAULT_GESTURE.to_string(),
            emergency_template_id: DEFAULT_TEMPLATE_ID.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ALERT_CONFIRMATION_TIMEOUT_SECS` - confirmation window (default: 10)
    /// - `ALERT_DELIVERY_TIMEOUT_SECS` - per-contact delivery timeout (default: 15)
    /// - `ALERT_KEYWORDS` - comma-separated voice keywords
    /// - `ALERT_GESTURE` - qualifying gesture label (default: two_fingers)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env::var("ALERT_CONFIRMATION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.confirmation_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env::var("ALERT_DELIVERY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.delivery_timeout = Duration::from_secs(secs);
        }

        if let Ok(keywords) = env::var("ALERT_KEYWORDS") {
            let keywords: Vec<String> = keywords
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if !keywords.is_empty() {
                config.emergency_keywords = keywords;
            }
        }

        if let Ok(gesture) = env::var("ALERT_GESTURE") {
            if !gesture.trim().is_empty() {
                config.emergency_gesture = gesture.trim().to_string();
            }
        }

        config
    }

    /// Set the confirmation window.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Set the per-contact delivery timeout.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the qualifying voice keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.emergency_keywords = keywords;
        self
    }

    /// Whether `text` contains any qualifying emergency keyword.
    pub fn matches_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.emergency_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}
