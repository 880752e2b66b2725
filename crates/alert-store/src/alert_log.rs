//! Alert history storage.

use alert_core::{Alert, AlertStore, StoreError};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::warn;

use crate::models::AlertRow;
use crate::{Database, DatabaseError, Result};

/// Append a resolved alert. Alert ids are unique; re-inserting an id is
/// an error, matching the "never mutated after append" contract.
pub async fn insert_alert(pool: &SqlitePool, alert: &Alert) -> Result<()> {
    let location = alert
        .location
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| corrupt(&alert.id, e.to_string()))?;

    let delivery_results = serde_json::to_string(&alert.delivery_results)
        .map_err(|e| corrupt(&alert.id, e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO alerts (
            id, trigger_kind, trigger_payload, confidence, occurred_at,
            location, confirmed, status, delivery_results, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&alert.id)
    .bind(alert.trigger.kind.as_str())
    .bind(&alert.trigger.payload)
    .bind(alert.trigger.confidence)
    .bind(alert.trigger.occurred_at.to_rfc3339())
    .bind(location)
    .bind(alert.confirmed)
    .bind(alert.status.as_str())
    .bind(delivery_results)
    .bind(alert.created_at.to_rfc3339())
    .bind(alert.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent alerts first, at most `limit`.
pub async fn recent_alerts(pool: &SqlitePool, limit: usize) -> Result<Vec<Alert>> {
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT id, trigger_kind, trigger_payload, confidence, occurred_at,
               location, confirmed, status, delivery_results, created_at, updated_at
        FROM alerts
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AlertRow::into_alert).collect()
}

/// Total number of recorded alerts.
pub async fn count_alerts(pool: &SqlitePool) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
        .fetch_one(pool)
        .await?;
    Ok(count as u64)
}

fn corrupt(id: &str, reason: String) -> DatabaseError {
    DatabaseError::Corrupt {
        entity: "alert",
        id: id.to_string(),
        reason,
    }
}

/// Durable [`AlertStore`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteAlertStore {
    db: Database,
}

impl SqliteAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn append(&self, alert: &Alert) -> std::result::Result<(), StoreError> {
        insert_alert(self.db.pool(), alert)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn recent(&self, limit: usize) -> std::result::Result<Vec<Alert>, StoreError> {
        recent_alerts(self.db.pool(), limit).await.map_err(|e| {
            warn!("failed to load alert history: {}", e);
            StoreError::Backend(e.to_string())
        })
    }

    async fn count(&self) -> std::result::Result<u64, StoreError> {
        count_alerts(self.db.pool())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
