//! Database row models and conversions to the core types.

use alert_core::{Alert, AlertStatus, Contact, Location, MessageTemplate, TriggerEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// A stored emergency contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub phone: String,
    pub name: String,
    pub relationship: String,
    pub priority: i64,
    pub enabled: bool,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            name: row.name,
            phone: row.phone,
            relationship: row.relationship,
            priority: row.priority.max(1) as u32,
            enabled: row.enabled,
        }
    }
}

/// A stored message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: String,
    pub body: String,
    /// JSON array of variable names.
    pub required_variables: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl TemplateRow {
    /// Decode into the core template type.
    pub fn into_template(self) -> std::result::Result<MessageTemplate, DatabaseError> {
        let required_variables: Vec<String> =
            serde_json::from_str(&self.required_variables).map_err(|e| DatabaseError::Corrupt {
                entity: "template",
                id: self.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(MessageTemplate {
            id: self.id,
            body: self.body,
            required_variables,
        })
    }
}

/// A stored alert history record.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AlertRow {
    pub id: String,
    pub trigger_kind: String,
    pub trigger_payload: String,
    pub confidence: f64,
    /// RFC 3339 timestamp of the trigger event.
    pub occurred_at: String,
    /// JSON-encoded [`Location`], null when unresolved.
    pub location: Option<String>,
    pub confirmed: bool,
    pub status: String,
    /// JSON array of delivery results.
    pub delivery_results: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_timestamp(value: &str, id: &str) -> std::result::Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt {
            entity: "alert",
            id: id.to_string(),
            reason: format!("bad timestamp {:?}: {}", value, e),
        })
}

impl AlertRow {
    /// Decode into the core alert type.
    pub fn into_alert(self) -> std::result::Result<Alert, DatabaseError> {
        let corrupt = |reason: String| DatabaseError::Corrupt {
            entity: "alert",
            id: self.id.clone(),
            reason,
        };

        let kind = serde_json::from_value(serde_json::Value::String(self.trigger_kind.clone()))
            .map_err(|e| corrupt(format!("bad trigger kind: {}", e)))?;

        let location: Option<Location> = match &self.location {
            Some(json) => {
                Some(serde_json::from_str(json).map_err(|e| corrupt(e.to_string()))?)
            }
            None => None,
        };

        let delivery_results = serde_json::from_str(&self.delivery_results)
            .map_err(|e| corrupt(e.to_string()))?;

        let status = AlertStatus::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status {:?}", self.status)))?;

        Ok(Alert {
            trigger: TriggerEvent {
                kind,
                payload: self.trigger_payload.clone(),
                confidence: self.confidence,
                occurred_at: parse_timestamp(&self.occurred_at, &self.id)?,
            },
            location,
            created_at: parse_timestamp(&self.created_at, &self.id)?,
            updated_at: parse_timestamp(&self.updated_at, &self.id)?,
            confirmed: self.confirmed,
            delivery_results,
            status,
            id: self.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_row_conversion() {
        let row = ContactRow {
            phone: "+15550001111".to_string(),
            name: "Alice".to_string(),
            relationship: "Family".to_string(),
            priority: 1,
            enabled: true,
            updated_at: "2026-01-01 00:00:00".to_string(),
        };
        let contact: Contact = row.into();
        assert_eq!(contact.name, "Alice");
        assert_eq!(contact.priority, 1);
        assert!(contact.enabled);
    }

    #[test]
    fn test_template_row_bad_json_is_corrupt() {
        let row = TemplateRow {
            id: "emergency_alert".to_string(),
            body: "body".to_string(),
            required_variables: "not json".to_string(),
            updated_at: String::new(),
        };
        assert!(matches!(
            row.into_template(),
            Err(DatabaseError::Corrupt { .. })
        ));
    }
}
