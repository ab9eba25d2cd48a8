//! In-memory collaborators for orchestration tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

use ridepass_core::fanout::{fan_out, CheckoutContext};
use ridepass_core::loyalty::reward_line;
use ridepass_core::{
    CartLine, FanOutRule, Issuer, Money, PaymentMode, TicketBundle, TicketLayout, TicketRecord,
    TransactionId,
};

use crate::client::{LoyaltyBalance, LoyaltyService, TicketService};
use crate::error::{SubmitError, SyncError, SyncResult};
use crate::events::{RegisterEventEmitter, RegisterStatus};
use crate::journal::TicketJournal;
use crate::printer::TicketPrinter;
use crate::submission::DrainOutcome;

/// COMBO ₹500 x1 and TL TRAIN ₹50 x2, optionally with the reward line.
pub fn bundle(phone: Option<&str>, with_reward: bool) -> TicketBundle {
    let mut lines = vec![
        CartLine {
            product_ref: "19".into(),
            display_name: "COMBO".into(),
            unit_price: Money::from_major(500),
            quantity: 1,
            fan_out: FanOutRule::Flat,
        },
        CartLine {
            product_ref: "4".into(),
            display_name: "TL TRAIN".into(),
            unit_price: Money::from_major(50),
            quantity: 2,
            fan_out: FanOutRule::PerUnit,
        },
    ];
    if with_reward {
        lines.push(reward_line());
    }
    let now = Utc::now();
    fan_out(
        &lines,
        &CheckoutContext {
            transaction_id: TransactionId::generate(now),
            issued_at: now,
            phone: phone.map(str::to_string),
            payment_mode: PaymentMode::Cash,
            issuer: Issuer::named("Asha"),
        },
    )
    .unwrap()
}

/// Accepts every batch unless a failure was scripted.
#[derive(Default)]
pub struct FakeTickets {
    accepted: Mutex<Vec<Vec<TicketRecord>>>,
    scripted: Mutex<VecDeque<SubmitError>>,
    online: Mutex<Option<bool>>,
}

impl FakeTickets {
    pub fn fail_next(&self, err: SubmitError) {
        self.scripted.lock().unwrap().push_back(err);
    }

    pub fn set_reachable(&self, reachable: bool) {
        *self.online.lock().unwrap() = Some(reachable);
    }

    /// Accepted batches, in order.
    pub fn batches(&self) -> Vec<Vec<TicketRecord>> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketService for FakeTickets {
    async fn submit_batch(&self, records: &[TicketRecord]) -> Result<(), SubmitError> {
        if let Some(err) = self.scripted.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.accepted.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    async fn probe(&self) -> bool {
        self.online.lock().unwrap().unwrap_or(true)
    }
}

/// Blocks the first submission until released. Later submissions return
/// whatever `fail_next` scripted, else succeed.
#[derive(Default)]
pub struct GatedTickets {
    pub entered: Notify,
    pub release: Notify,
    gate_used: AtomicBool,
    scripted: Mutex<VecDeque<SubmitError>>,
}

impl GatedTickets {
    pub fn fail_next(&self, err: SubmitError) {
        self.scripted.lock().unwrap().push_back(err);
    }
}

#[async_trait]
impl TicketService for GatedTickets {
    async fn submit_batch(&self, _records: &[TicketRecord]) -> Result<(), SubmitError> {
        if !self.gate_used.swap(true, Ordering::AcqRel) {
            self.entered.notify_one();
            self.release.notified().await;
            return Ok(());
        }
        match self.scripted.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn probe(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct FakeLoyalty {
    earned: Mutex<Vec<(String, Money, String)>>,
    redeemed: Mutex<usize>,
    fail: Mutex<bool>,
    balance: Mutex<i64>,
}

impl FakeLoyalty {
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn set_balance(&self, points: i64) {
        *self.balance.lock().unwrap() = points;
    }

    pub fn earned(&self) -> Vec<(String, Money, String)> {
        self.earned.lock().unwrap().clone()
    }

    pub fn redeemed(&self) -> usize {
        *self.redeemed.lock().unwrap()
    }

    fn check(&self) -> SyncResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(SyncError::ConnectionFailed("loyalty down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LoyaltyService for FakeLoyalty {
    async fn earn(&self, phone: &str, amount: Money, ticket_ref: &str) -> SyncResult<LoyaltyBalance> {
        self.check()?;
        self.earned
            .lock()
            .unwrap()
            .push((phone.to_string(), amount, ticket_ref.to_string()));
        let mut balance = self.balance.lock().unwrap();
        *balance += ridepass_core::loyalty::points_for(amount);
        Ok(LoyaltyBalance { points: *balance })
    }

    async fn redeem(&self, _phone: &str, _ticket_ref: &str) -> SyncResult<LoyaltyBalance> {
        self.check()?;
        *self.redeemed.lock().unwrap() += 1;
        let mut balance = self.balance.lock().unwrap();
        *balance -= ridepass_core::loyalty::REDEEM_COST_POINTS;
        Ok(LoyaltyBalance { points: *balance })
    }

    async fn lookup(&self, _phone: &str) -> SyncResult<LoyaltyBalance> {
        self.check()?;
        Ok(LoyaltyBalance {
            points: *self.balance.lock().unwrap(),
        })
    }
}

#[derive(Default)]
pub struct RecordingPrinter {
    jobs: Mutex<Vec<TicketLayout>>,
}

impl RecordingPrinter {
    pub fn jobs(&self) -> Vec<TicketLayout> {
        self.jobs.lock().unwrap().clone()
    }
}

impl TicketPrinter for RecordingPrinter {
    fn print(&self, layout: &TicketLayout) {
        self.jobs.lock().unwrap().push(layout.clone());
    }
}

#[derive(Default)]
pub struct MemoryJournal {
    bundles: Mutex<Vec<TicketBundle>>,
    fail: Mutex<bool>,
}

impl MemoryJournal {
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn bundles(&self) -> Vec<TicketBundle> {
        self.bundles.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketJournal for MemoryJournal {
    async fn record(&self, bundle: &TicketBundle) -> SyncResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(SyncError::DatabaseError("disk full".into()));
        }
        self.bundles.lock().unwrap().push(bundle.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingEmitter {
    statuses: Mutex<Vec<RegisterStatus>>,
    drains: Mutex<Vec<DrainOutcome>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingEmitter {
    pub fn last_status(&self) -> Option<RegisterStatus> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn drains(&self) -> Vec<DrainOutcome> {
        self.drains.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl RegisterEventEmitter for RecordingEmitter {
    fn emit_status(&self, status: &RegisterStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }

    fn emit_drain(&self, outcome: &DrainOutcome) {
        self.drains.lock().unwrap().push(outcome.clone());
    }

    fn emit_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
