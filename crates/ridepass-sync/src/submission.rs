//! # Background Submission & Drain
//!
//! Everything that happens after the paper is out.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    persist(bundle, loyalty plan)                        │
//! │                                                                         │
//! │  offline? ──yes──► append to queue ──► Queued                          │
//! │     │                                                                   │
//! │     no                                                                  │
//! │     ▼                                                                   │
//! │  POST master + subs as one batch                                        │
//! │     │                                                                   │
//! │     ├── accepted ──► loyalty earn / redeem (best effort) ──► Persisted │
//! │     │                                                                   │
//! │     ├── 400 ──► ResetQueue: clear queue     ──► Rejected               │
//! │     │           DropBatch:  leave queue                                 │
//! │     │                                                                   │
//! │     └── other ──► append to queue ──► Queued                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Drain Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Offline ──► Online transition, or an explicit drain()                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  draining flag false → true ? ──no──► Skipped(Busy)                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  snapshot queue ──empty──► Skipped(Empty)                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  POST whole snapshot                                                    │
//! │     ├── accepted ──► remove snapshot prefix ──► Drained                │
//! │     └── any failure ──► queue untouched ──► Failed                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed drain is not retried on a timer. The next Offline to Online
//! transition (or an operator drain) tries again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use ridepass_core::{LoyaltyPlan, TicketBundle, TicketRecord};

use crate::client::{LoyaltyBalance, LoyaltyService, TicketService};
use crate::config::BadRequestPolicy;
use crate::error::{SubmitError, SyncResult};
use crate::events::{NoOpEmitter, RegisterEventEmitter, RegisterStatus};
use crate::queue::DurableQueue;

// =============================================================================
// Outcomes
// =============================================================================

/// Captured result of one background submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The batch was accepted. `loyalty` is `None` when no loyalty call was
    /// owed.
    Persisted { loyalty: Option<LoyaltySettlement> },
    /// The batch went to the durable queue.
    Queued { pending: usize },
    /// The service refused the batch as malformed; it was dropped.
    Rejected { status: u16, queue_cleared: bool },
    /// Neither the service nor the queue took the batch.
    Lost { error: String },
}

/// Result of each best-effort loyalty call. Failures are kept as messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoyaltySettlement {
    pub earn: Option<Result<LoyaltyBalance, String>>,
    pub redeems: Vec<Result<LoyaltyBalance, String>>,
}

impl LoyaltySettlement {
    /// Balance reported by the last successful call.
    pub fn latest_balance(&self) -> Option<i64> {
        self.redeems
            .iter()
            .rev()
            .chain(self.earn.iter())
            .find_map(|r| r.as_ref().ok())
            .map(|b| b.points)
    }

    pub fn failures(&self) -> usize {
        self.earn
            .iter()
            .chain(self.redeems.iter())
            .filter(|r| r.is_err())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another drain is in flight.
    Busy,
    /// Nothing queued.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    Drained { count: usize, remaining: usize },
    Failed { error: String, pending: usize },
    Skipped(SkipReason),
}

// =============================================================================
// Sync Handle
// =============================================================================

struct Shared {
    tickets: Arc<dyn TicketService>,
    loyalty: Arc<dyn LoyaltyService>,
    queue: Arc<dyn DurableQueue>,
    emitter: Arc<dyn RegisterEventEmitter>,
    policy: BadRequestPolicy,
    online: AtomicBool,
    draining: AtomicBool,
    pending: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

/// Shared handle over remote persistence, the durable queue and the
/// connectivity flag. Cheap to clone; every clone sees the same state.
#[derive(Clone)]
pub struct SyncHandle {
    shared: Arc<Shared>,
}

/// Clears the draining flag however the drain ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builder for [`SyncHandle`]. Optional pieces are fixed before the shared
/// state exists, so every clone of the built handle sees them.
pub struct SyncHandleBuilder {
    tickets: Arc<dyn TicketService>,
    loyalty: Arc<dyn LoyaltyService>,
    queue: Arc<dyn DurableQueue>,
    policy: BadRequestPolicy,
    emitter: Option<Arc<dyn RegisterEventEmitter>>,
}

impl SyncHandleBuilder {
    pub fn new(
        tickets: Arc<dyn TicketService>,
        loyalty: Arc<dyn LoyaltyService>,
        queue: Arc<dyn DurableQueue>,
        policy: BadRequestPolicy,
    ) -> Self {
        SyncHandleBuilder {
            tickets,
            loyalty,
            queue,
            policy,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn RegisterEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn build(self) -> SyncHandle {
        SyncHandle {
            shared: Arc::new(Shared {
                tickets: self.tickets,
                loyalty: self.loyalty,
                queue: self.queue,
                emitter: self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter)),
                policy: self.policy,
                online: AtomicBool::new(false),
                draining: AtomicBool::new(false),
                pending: AtomicUsize::new(0),
                last_error: Mutex::new(None),
            }),
        }
    }
}

impl SyncHandle {
    /// Starts offline with a pending count of zero and no event emitter;
    /// call [`SyncHandle::resume`] to pick up a queue left by a previous run.
    pub fn new(
        tickets: Arc<dyn TicketService>,
        loyalty: Arc<dyn LoyaltyService>,
        queue: Arc<dyn DurableQueue>,
        policy: BadRequestPolicy,
    ) -> Self {
        SyncHandleBuilder::new(tickets, loyalty, queue, policy).build()
    }

    pub fn builder(
        tickets: Arc<dyn TicketService>,
        loyalty: Arc<dyn LoyaltyService>,
        queue: Arc<dyn DurableQueue>,
        policy: BadRequestPolicy,
    ) -> SyncHandleBuilder {
        SyncHandleBuilder::new(tickets, loyalty, queue, policy)
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::Acquire)
    }

    pub fn is_draining(&self) -> bool {
        self.shared.draining.load(Ordering::Acquire)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    pub fn status(&self) -> RegisterStatus {
        RegisterStatus {
            online: self.is_online(),
            pending_count: self.pending_count(),
            draining: self.is_draining(),
            last_error: self.shared.last_error.lock().ok().and_then(|e| e.clone()),
        }
    }

    fn publish_status(&self) {
        self.shared.emitter.emit_status(&self.status());
    }

    fn swallow(&self, message: String) {
        if let Ok(mut last) = self.shared.last_error.lock() {
            *last = Some(message.clone());
        }
        self.shared.emitter.emit_error(&message);
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Records connectivity. An Offline to Online transition triggers a
    /// drain, whose outcome is returned; any other call returns `None`.
    pub async fn set_online(&self, online: bool) -> Option<DrainOutcome> {
        let was_online = self.shared.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        info!(online, "Connectivity changed");
        self.publish_status();

        if online {
            Some(self.drain().await)
        } else {
            None
        }
    }

    /// Reloads the pending count from the queue and drains once if online.
    pub async fn resume(&self) -> SyncResult<Option<DrainOutcome>> {
        let pending = self.shared.queue.len().await?;
        self.shared.pending.store(pending, Ordering::Release);
        info!(pending, online = self.is_online(), "Restored pending ticket queue");
        self.publish_status();

        if self.is_online() && pending > 0 {
            Ok(Some(self.drain().await))
        } else {
            Ok(None)
        }
    }

    // =========================================================================
    // Drain
    // =========================================================================

    /// Submits the whole queue as one batch.
    pub async fn drain(&self) -> DrainOutcome {
        if self
            .shared
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Drain already in flight, skipping");
            return DrainOutcome::Skipped(SkipReason::Busy);
        }
        let _guard = DrainGuard(&self.shared.draining);
        self.publish_status();

        let outcome = self.drain_inner().await;
        drop(_guard);

        self.shared.emitter.emit_drain(&outcome);
        self.publish_status();
        outcome
    }

    async fn drain_inner(&self) -> DrainOutcome {
        let snapshot = match self.shared.queue.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to read pending ticket queue");
                return DrainOutcome::Failed {
                    error: e.to_string(),
                    pending: self.pending_count(),
                };
            }
        };

        if snapshot.is_empty() {
            self.shared.pending.store(0, Ordering::Release);
            return DrainOutcome::Skipped(SkipReason::Empty);
        }

        info!(count = snapshot.len(), "Draining pending tickets");
        if let Err(e) = self.shared.tickets.submit_batch(&snapshot).await {
            warn!(error = %e, count = snapshot.len(), "Drain failed, queue kept");
            self.swallow(format!("Drain failed: {e}"));
            return DrainOutcome::Failed {
                error: e.to_string(),
                pending: self.pending_count(),
            };
        }

        let submitted: Vec<String> = snapshot.iter().map(|r| r.id.clone()).collect();
        match self.shared.queue.remove_submitted(&submitted).await {
            Ok(remaining) => {
                self.shared.pending.store(remaining, Ordering::Release);
                info!(count = snapshot.len(), remaining, "Pending tickets synced");
                DrainOutcome::Drained {
                    count: snapshot.len(),
                    remaining,
                }
            }
            Err(e) => {
                // Accepted remotely but still queued locally; the next drain
                // resubmits them.
                error!(error = %e, "Failed to trim drained tickets from queue");
                DrainOutcome::Failed {
                    error: e.to_string(),
                    pending: self.pending_count(),
                }
            }
        }
    }

    // =========================================================================
    // Background Persistence
    // =========================================================================

    /// Persists one printed bundle, queueing it when the service is out of
    /// reach. Loyalty calls run only after the batch is accepted.
    pub async fn persist(&self, bundle: TicketBundle, loyalty: Option<LoyaltyPlan>) -> SubmissionOutcome {
        let records = bundle.to_records();
        let transaction_id = bundle.transaction_id();

        if !self.is_online() {
            debug!(transaction_id = %transaction_id, "Offline, queueing without submitting");
            return self.enqueue(&records).await;
        }

        let outcome = match self.shared.tickets.submit_batch(&records).await {
            Ok(()) => {
                info!(
                    transaction_id = %transaction_id,
                    count = records.len(),
                    "Bundle persisted"
                );
                let settlement = match loyalty {
                    Some(plan) => Some(self.settle_loyalty(&plan).await),
                    None => None,
                };
                SubmissionOutcome::Persisted {
                    loyalty: settlement,
                }
            }
            Err(SubmitError::Rejected { status }) => self.reject(transaction_id, status).await,
            Err(SubmitError::Unavailable(reason)) => {
                warn!(
                    transaction_id = %transaction_id,
                    reason = %reason,
                    "Background save failed, queueing locally"
                );
                self.enqueue(&records).await
            }
        };

        self.publish_status();
        outcome
    }

    async fn enqueue(&self, records: &[TicketRecord]) -> SubmissionOutcome {
        let outcome = match self.shared.queue.append(records).await {
            Ok(pending) => {
                self.shared.pending.store(pending, Ordering::Release);
                SubmissionOutcome::Queued { pending }
            }
            Err(e) => {
                error!(error = %e, count = records.len(), "Failed to queue tickets");
                self.swallow(format!("Failed to queue tickets: {e}"));
                SubmissionOutcome::Lost {
                    error: e.to_string(),
                }
            }
        };
        self.publish_status();
        outcome
    }

    async fn reject(&self, transaction_id: &str, status: u16) -> SubmissionOutcome {
        let queue_cleared = match self.shared.policy {
            BadRequestPolicy::ResetQueue => match self.shared.queue.clear().await {
                Ok(()) => {
                    self.shared.pending.store(0, Ordering::Release);
                    true
                }
                Err(e) => {
                    error!(error = %e, "Failed to clear queue after rejection");
                    false
                }
            },
            BadRequestPolicy::DropBatch => false,
        };

        error!(
            transaction_id = %transaction_id,
            status,
            queue_cleared,
            policy = %self.shared.policy,
            "Ticket batch rejected as malformed, dropped"
        );
        self.swallow(format!("Ticket batch {transaction_id} rejected with HTTP {status}"));

        SubmissionOutcome::Rejected {
            status,
            queue_cleared,
        }
    }

    async fn settle_loyalty(&self, plan: &LoyaltyPlan) -> LoyaltySettlement {
        let loyalty = &self.shared.loyalty;
        let mut settlement = LoyaltySettlement::default();

        if let Some(amount) = plan.earn {
            let result = loyalty
                .earn(&plan.phone, amount, &plan.ticket_ref)
                .await
                .map_err(|e| e.to_string());
            if let Err(e) = &result {
                warn!(ticket_ref = %plan.ticket_ref, error = %e, "Loyalty earn failed");
            }
            settlement.earn = Some(result);
        }

        for _ in 0..plan.redeem_count {
            let result = loyalty
                .redeem(&plan.phone, &plan.ticket_ref)
                .await
                .map_err(|e| e.to_string());
            if let Err(e) = &result {
                warn!(ticket_ref = %plan.ticket_ref, error = %e, "Loyalty redeem failed");
            }
            settlement.redeems.push(result);
        }

        debug!(
            ticket_ref = %plan.ticket_ref,
            failures = settlement.failures(),
            balance = ?settlement.latest_balance(),
            "Loyalty settled"
        );
        settlement
    }
}
