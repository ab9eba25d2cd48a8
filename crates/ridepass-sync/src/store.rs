//! # Settings Store
//!
//! Key-value persistence seam for the print layout and the offline queue.
//! Production uses the SQLite `local_settings` table; tests use the
//! in-memory map.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use ridepass_db::Database;

use crate::error::SyncResult;

/// Persistent string key-value store that survives restarts.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> SyncResult<()>;
}

#[async_trait]
impl SettingsStore for Database {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.settings().get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        Ok(self.settings().set(key, value).await?)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepass_db::DbConfig;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_database_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store: &dyn SettingsStore = &db;
        store.set("print_settings", "{}").await.unwrap();
        assert_eq!(store.get("print_settings").await.unwrap().as_deref(), Some("{}"));
    }
}
