//! # Connectivity Monitor
//!
//! Probes the ticket service on a fixed interval and reports transitions to
//! the [`SyncHandle`]. Coming back online is what triggers a queue drain.
//!
//! ```text
//!   interval tick ──► probe() ──► changed? ──► SyncHandle::set_online
//!                                    │              │
//!                                    no             └─ off→on: drain
//!                                    ▼
//!                                 (nothing)
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::client::TicketService;
use crate::error::{SyncError, SyncResult};
use crate::submission::{DrainOutcome, SyncHandle};

enum MonitorCommand {
    CheckNow(oneshot::Sender<bool>),
    Shutdown,
}

pub struct ConnectivityMonitor {
    tickets: Arc<dyn TicketService>,
    sync: SyncHandle,
    probe_interval: Duration,
}

/// Controls a running monitor.
#[derive(Clone)]
pub struct ConnectivityHandle {
    cmd_tx: mpsc::Sender<MonitorCommand>,
}

impl ConnectivityHandle {
    /// Probes immediately and returns the observed reachability.
    pub async fn check_now(&self) -> SyncResult<bool> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(MonitorCommand::CheckNow(tx))
            .await
            .map_err(|_| SyncError::Internal("Connectivity monitor stopped".into()))?;
        rx.await
            .map_err(|_| SyncError::Internal("Connectivity monitor stopped".into()))
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(MonitorCommand::Shutdown).await;
    }
}

impl ConnectivityMonitor {
    pub fn new(tickets: Arc<dyn TicketService>, sync: SyncHandle, probe_interval: Duration) -> Self {
        ConnectivityMonitor {
            tickets,
            sync,
            probe_interval,
        }
    }

    /// One probe. Returns the drain outcome when this probe brought the
    /// register back online.
    pub async fn probe_once(&self) -> (bool, Option<DrainOutcome>) {
        let reachable = self.tickets.probe().await;
        debug!(reachable, "Connectivity probe");
        let drained = self.sync.set_online(reachable).await;
        (reachable, drained)
    }

    /// Spawns the probe loop. The first probe runs immediately.
    pub fn start(self) -> ConnectivityHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });
        ConnectivityHandle { cmd_tx }
    }

    async fn run(self, mut cmd_rx: mpsc::Receiver<MonitorCommand>) {
        info!(interval = ?self.probe_interval, "Connectivity monitor started");

        let mut ticker = interval(self.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(MonitorCommand::CheckNow(reply)) => {
                        let (reachable, _) = self.probe_once().await;
                        let _ = reply.send(reachable);
                    }
                    Some(MonitorCommand::Shutdown) | None => {
                        info!("Connectivity monitor shutting down");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BadRequestPolicy;
    use crate::queue::{DurableQueue, SettingsQueue};
    use crate::store::MemorySettingsStore;
    use crate::testing::{bundle, FakeLoyalty, FakeTickets};

    fn setup() -> (Arc<FakeTickets>, Arc<SettingsQueue>, SyncHandle) {
        let tickets = Arc::new(FakeTickets::default());
        let queue = Arc::new(SettingsQueue::new(Arc::new(MemorySettingsStore::new())));
        let sync = SyncHandle::new(
            tickets.clone(),
            Arc::new(FakeLoyalty::default()),
            queue.clone(),
            BadRequestPolicy::ResetQueue,
        );
        (tickets, queue, sync)
    }

    #[tokio::test]
    async fn test_reconnect_drains_queue() {
        let (tickets, queue, sync) = setup();
        sync.persist(bundle(None, false), None).await;
        assert_eq!(queue.len().await.unwrap(), 9);

        let monitor = ConnectivityMonitor::new(tickets.clone(), sync.clone(), Duration::from_secs(15));
        let (reachable, drained) = monitor.probe_once().await;

        assert!(reachable);
        assert!(matches!(drained, Some(DrainOutcome::Drained { count: 9, remaining: 0 })));
        assert_eq!(queue.len().await.unwrap(), 0);
        assert_eq!(tickets.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_steady_state_does_not_drain() {
        let (tickets, _queue, sync) = setup();
        let monitor = ConnectivityMonitor::new(tickets.clone(), sync.clone(), Duration::from_secs(15));

        assert!(monitor.probe_once().await.1.is_some());
        assert!(monitor.probe_once().await.1.is_none());

        tickets.set_reachable(false);
        let (reachable, drained) = monitor.probe_once().await;
        assert!(!reachable);
        assert!(drained.is_none());
        assert!(!sync.is_online());
    }

    #[tokio::test]
    async fn test_handle_check_now_and_shutdown() {
        let (tickets, _queue, sync) = setup();
        tickets.set_reachable(false);
        let handle = ConnectivityMonitor::new(tickets.clone(), sync.clone(), Duration::from_secs(3600)).start();

        assert!(!handle.check_now().await.unwrap());
        tickets.set_reachable(true);
        assert!(handle.check_now().await.unwrap());
        assert!(sync.is_online());

        handle.shutdown().await;
        tokio::task::yield_now().await;
        assert!(handle.check_now().await.is_err());
    }
}
