//! # Durable Queue
//!
//! Tickets whose remote submission failed, in insertion order, persisted
//! under one settings key so they survive a restart.
//!
//! ## Queue Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    pending_tickets (JSON array)                         │
//! │                                                                         │
//! │  submission fails ──► append(master, subs...)                          │
//! │                                                                         │
//! │  drain:  snapshot() ──► POST whole snapshot as one batch               │
//! │             │                                                           │
//! │             ├── accepted ──► remove_submitted(snapshot ids)             │
//! │             └── failed   ──► untouched                                  │
//! │                                                                         │
//! │  400 on a fresh submission (reset policy) ──► clear()                  │
//! │                                                                         │
//! │  stored value is not a list of tickets ──► reset to []                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read-modify-write holds one lock. Removal after a drain matches the
//! submitted records by id from the head of the queue, so records appended
//! or a reset made while the batch was in flight are never trimmed blindly.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use ridepass_core::TicketRecord;

use crate::error::SyncResult;
use crate::store::SettingsStore;

/// Settings key holding the queue.
pub const QUEUE_KEY: &str = "pending_tickets";

/// Ordered, persistent list of tickets awaiting remote persistence.
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Appends `records` at the tail. Returns the new length.
    async fn append(&self, records: &[TicketRecord]) -> SyncResult<usize>;

    /// Current contents, oldest first.
    async fn snapshot(&self) -> SyncResult<Vec<TicketRecord>>;

    /// Removes the leading records whose ids match `submitted`, in order,
    /// stopping at the first mismatch. Returns the remaining length.
    async fn remove_submitted(&self, submitted: &[String]) -> SyncResult<usize>;

    async fn clear(&self) -> SyncResult<()>;

    async fn len(&self) -> SyncResult<usize> {
        Ok(self.snapshot().await?.len())
    }
}

/// [`DurableQueue`] stored as a JSON array in a [`SettingsStore`].
pub struct SettingsQueue {
    store: Arc<dyn SettingsStore>,
    lock: Mutex<()>,
}

impl SettingsQueue {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        SettingsQueue {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Reads the stored list, resetting it when it does not decode.
    async fn load(&self) -> SyncResult<Vec<TicketRecord>> {
        let Some(raw) = self.store.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<TicketRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(error = %e, "Pending ticket queue is corrupt, resetting");
                self.store.set(QUEUE_KEY, "[]").await?;
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, records: &[TicketRecord]) -> SyncResult<()> {
        let raw = serde_json::to_string(records)?;
        self.store.set(QUEUE_KEY, &raw).await
    }
}

#[async_trait]
impl DurableQueue for SettingsQueue {
    async fn append(&self, records: &[TicketRecord]) -> SyncResult<usize> {
        let _guard = self.lock.lock().await;
        let mut queued = self.load().await?;
        queued.extend_from_slice(records);
        self.save(&queued).await?;

        debug!(added = records.len(), pending = queued.len(), "Queued tickets");
        Ok(queued.len())
    }

    async fn snapshot(&self) -> SyncResult<Vec<TicketRecord>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn remove_submitted(&self, submitted: &[String]) -> SyncResult<usize> {
        let _guard = self.lock.lock().await;
        let mut queued = self.load().await?;

        let matched = queued
            .iter()
            .zip(submitted)
            .take_while(|(record, id)| record.id == **id)
            .count();
        if matched < submitted.len() {
            warn!(
                submitted = submitted.len(),
                matched,
                "Queue changed during drain, trimming only matching records"
            );
        }

        if matched > 0 {
            queued.drain(..matched);
            self.save(&queued).await?;
        }
        Ok(queued.len())
    }

    async fn clear(&self) -> SyncResult<()> {
        let _guard = self.lock.lock().await;
        self.store.set(QUEUE_KEY, "[]").await
    }
}
