//! Data types shared across the alert pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::DeliveryReceipt;

/// The kind of signal that started an emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// A spoken emergency keyword.
    Voice,
    /// A recognized emergency hand gesture.
    Gesture,
    /// The manual emergency button.
    Manual,
}

impl TriggerKind {
    /// String form used in messages and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Gesture => "gesture",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single trigger signal, created at detection time and consumed once
/// by the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    /// What was detected: the recognized utterance, the gesture label,
    /// or a description of the manual action.
    pub payload: String,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
    pub occurred_at: DateTime<Utc>,
}

impl TriggerEvent {
    fn new(kind: TriggerKind, payload: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind,
            payload: payload.into(),
            confidence: confidence.clamp(0.0, 1.0),
            occurred_at: Utc::now(),
        }
    }

    /// Build an event for a recognized voice keyword.
    pub fn voice(text: impl Into<String>, confidence: f64) -> Self {
        Self::new(TriggerKind::Voice, text, confidence)
    }

    /// Build an event for a recognized emergency gesture.
    pub fn gesture(label: impl Into<String>, confidence: f64) -> Self {
        Self::new(TriggerKind::Gesture, label, confidence)
    }

    /// Build an event for the manual emergency button.
    pub fn manual() -> Self {
        Self::new(TriggerKind::Manual, "manual emergency button pressed", 1.0)
    }
}

/// Where a location fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Ip,
    Gps,
    Cached,
}

/// A resolved position, normalized from whatever schema the lookup
/// provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub city: String,
    pub country: String,
    pub source: LocationSource,
    /// Provider-assigned accuracy score in [0, 1].
    pub accuracy: f64,
    pub resolved_at: DateTime<Utc>,
}

impl Location {
    /// Human-readable one-line summary for message bodies.
    pub fn summary(&self) -> String {
        if !self.city.is_empty() && !self.country.is_empty() {
            format!("{}, {}", self.city, self.country)
        } else if !self.address.is_empty() {
            self.address.clone()
        } else {
            format!("Coordinates: {}", self.coordinates())
        }
    }

    /// "lat, lon" with four decimal places.
    pub fn coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// An emergency contact. Priority orders delivery (1 = highest) but does
/// not gate it; every enabled contact is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
    pub priority: u32,
    pub enabled: bool,
}

impl Contact {
    /// Create an enabled contact.
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        relationship: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            relationship: relationship.into(),
            priority,
            enabled: true,
        }
    }

    /// Mark the contact disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A message template with `{variable}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub body: String,
    pub required_variables: Vec<String>,
}

impl MessageTemplate {
    pub fn new(
        id: impl Into<String>,
        body: impl Into<String>,
        required_variables: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            required_variables,
        }
    }

    /// Minimal built-in emergency body, used when the configured template
    /// cannot be found. An emergency send never fails for lack of copy.
    pub fn fallback_emergency() -> Self {
        Self::new(
            "emergency_fallback",
            "EMERGENCY ALERT!\n\nLocation: {location}\nTime: {timestamp}\nTrigger: {trigger_type}",
            vec![
                "location".to_string(),
                "timestamp".to_string(),
                "trigger_type".to_string(),
            ],
        )
    }
}

/// Outcome of one delivery attempt to one contact. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResult {
    pub contact_name: String,
    pub contact_phone: String,
    pub success: bool,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub delivery_status: String,
    pub sent_at: DateTime<Utc>,
}

impl MessageResult {
    /// Successful delivery through some channel.
    pub fn delivered(contact: &Contact, receipt: DeliveryReceipt) -> Self {
        Self {
            contact_name: contact.name.clone(),
            contact_phone: contact.phone.clone(),
            success: true,
            provider_message_id: Some(receipt.message_id),
            error: None,
            delivery_status: receipt.status,
            sent_at: Utc::now(),
        }
    }

    /// Failed delivery with a non-empty reason.
    pub fn failed(contact: &Contact, error: impl Into<String>) -> Self {
        Self {
            contact_name: contact.name.clone(),
            contact_phone: contact.phone.clone(),
            success: false,
            provider_message_id: None,
            error: Some(error.into()),
            delivery_status: "failed".to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// Lifecycle status of an alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emergency alert, from trigger through resolution. Owned by the
/// orchestrator; immutable once appended to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub trigger: TriggerEvent,
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed: bool,
    pub delivery_results: Vec<MessageResult>,
    pub status: AlertStatus,
}

impl Alert {
    /// Create a fresh pending alert for a trigger event.
    pub fn pending(trigger: TriggerEvent) -> Self {
        let now = Utc::now();
        Self {
            id: format!("alert-{}", Uuid::new_v4().simple()),
            trigger,
            location: None,
            created_at: now,
            updated_at: now,
            confirmed: false,
            delivery_results: Vec::new(),
            status: AlertStatus::Pending,
        }
    }
}
