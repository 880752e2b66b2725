//! Alert history repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::types::Alert;

/// Repository for resolved alerts.
///
/// The orchestrator depends on this abstraction so persistence can be
/// swapped without touching orchestration logic: in-memory for tests and
/// standalone use, a durable store for production.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Append a resolved alert to history.
    async fn append(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Most recent alerts first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<Alert>, StoreError>;

    /// Total number of recorded alerts.
    async fn count(&self) -> Result<u64, StoreError>;
}

/// In-memory alert history.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn append(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.write().await.push(alert.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Alert>, StoreError> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.alerts.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriggerEvent;

    #[tokio::test]
    async fn test_memory_store_append_and_recent() {
        let store = MemoryAlertStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        let first = Alert::pending(TriggerEvent::manual());
        let second = Alert::pending(TriggerEvent::voice("help", 0.9));
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        // Most recent first.
        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);

        let limited = store.recent(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second.id);
    }
}
