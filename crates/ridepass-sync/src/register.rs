//! # Register
//!
//! The operator-facing orchestrator. One `Register` per terminal, driven by
//! a single UI thread; only the background submission it spawns runs
//! concurrently.
//!
//! ## Checkout Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Idle ── checkout ──► AwaitingConfirm ── confirm ──► Committing         │
//! │    ▲                    │      ▲                        │               │
//! │    └──── cancel ────────┘      │ nudge layout,          │ 1. journal    │
//! │          (cart kept)           │ preview re-rendered    │ 2. print      │
//! │                                                         │ 3. spawn      │
//! │                                                         │    persist    │
//! │                                                         ▼               │
//! │  Idle ◄──── done / edit cart ───────────────────────  Settled           │
//! │                                                        │   ▲            │
//! │                                                reprint └───┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settlement never waits on the network. The caller gets the background
//! task's [`JoinHandle`] and may ignore it.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ridepass_core::fanout::{self, CheckoutContext};
use ridepass_core::validation::{is_loyalty_phone, validate_phone};
use ridepass_core::{
    reprint, Cart, Catalog, CoreError, Issuer, LoyaltyPlan, PaymentMode, PrintSettings,
    RegisterAction, RegisterState, TicketBundle, TicketLayout, TransactionId,
};

use crate::client::LoyaltyService;
use crate::error::{SyncError, SyncResult};
use crate::journal::TicketJournal;
use crate::layout::{LayoutNudge, PrintLayoutController};
use crate::printer::TicketPrinter;
use crate::submission::{SubmissionOutcome, SyncHandle};

/// What confirm and reprint hand back once the paper is out.
#[derive(Debug)]
pub struct Submission {
    pub bundle: TicketBundle,
    /// Exactly what was sent to the printer.
    pub layout: TicketLayout,
    /// Background persistence. Resolves to the captured outcome.
    pub task: JoinHandle<SubmissionOutcome>,
}

pub struct Register {
    catalog: Catalog,
    cart: Cart,
    state: RegisterState,
    phone: Option<String>,
    payment_mode: Option<PaymentMode>,
    issuer: Issuer,
    layout: PrintLayoutController,
    /// Bundle shown in preview.
    pending: Option<TicketBundle>,
    /// Last bundle that reached the printer, kept for reprint.
    printed: Option<TicketBundle>,
    sync: SyncHandle,
    loyalty: Arc<dyn LoyaltyService>,
    journal: Arc<dyn TicketJournal>,
    printer: Arc<dyn TicketPrinter>,
}

impl Register {
    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> RegisterState {
        self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replaces the catalog. Lines already in the cart are kept.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn payment_mode(&self) -> Option<PaymentMode> {
        self.payment_mode
    }

    pub fn print_settings(&self) -> PrintSettings {
        self.layout.settings()
    }

    pub fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    pub fn last_printed(&self) -> Option<&TicketBundle> {
        self.printed.as_ref()
    }

    // =========================================================================
    // Cart Editing
    // =========================================================================

    /// Checks that the cart may be edited and leaves `Settled` for `Idle`.
    fn begin_edit(&mut self) -> SyncResult<()> {
        self.state = self.state.apply(RegisterAction::EditCart)?;
        Ok(())
    }

    pub fn add_item(&mut self, product_ref: &str, qty: i64) -> SyncResult<()> {
        let item = self
            .catalog
            .get(product_ref)
            .ok_or_else(|| CoreError::ProductNotFound(product_ref.to_string()))?
            .clone();
        self.begin_edit()?;
        self.cart.add_product(&item, qty)?;
        debug!(product_ref, qty, lines = self.cart.len(), "Added to cart");
        Ok(())
    }

    pub fn change_quantity(&mut self, product_ref: &str, delta: i64) -> SyncResult<()> {
        self.begin_edit()?;
        self.cart.change_quantity(product_ref, delta)?;
        Ok(())
    }

    pub fn remove_item(&mut self, product_ref: &str) -> SyncResult<()> {
        self.begin_edit()?;
        self.cart.remove(product_ref)?;
        Ok(())
    }

    pub fn clear_cart(&mut self) -> SyncResult<()> {
        self.begin_edit()?;
        self.cart.clear();
        Ok(())
    }

    /// Adds the loyalty reward line. Returns `false` if already present.
    pub fn add_reward(&mut self) -> SyncResult<bool> {
        self.begin_edit()?;
        Ok(self.cart.add_reward()?)
    }

    /// Sets the customer phone; an empty string clears it.
    pub fn set_phone(&mut self, phone: &str) -> SyncResult<()> {
        self.begin_edit()?;
        if phone.trim().is_empty() {
            self.phone = None;
        } else {
            self.phone = Some(validate_phone(phone).map_err(CoreError::from)?);
        }
        Ok(())
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) -> SyncResult<()> {
        self.begin_edit()?;
        self.payment_mode = Some(mode);
        Ok(())
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Fans the cart out under a fresh transaction id and shows the preview.
    pub fn checkout(&mut self) -> SyncResult<TicketLayout> {
        let next = self.state.apply(RegisterAction::Checkout)?;

        let now = Utc::now();
        let ctx = CheckoutContext {
            transaction_id: TransactionId::generate(now),
            issued_at: now,
            phone: self.phone.clone(),
            payment_mode: self.payment_mode.unwrap_or_default(),
            issuer: self.issuer.clone(),
        };
        let bundle = fanout::fan_out(self.cart.lines(), &ctx)?;
        self.state = next;

        info!(
            transaction_id = %bundle.transaction_id(),
            total = %bundle.total(),
            sub_tickets = bundle.sub_tickets.len(),
            "Checkout preview"
        );
        let preview = self.layout.layout(&bundle, true);
        self.pending = Some(bundle);
        Ok(preview)
    }

    /// The current preview, re-rendered with the latest settings.
    pub fn preview(&self) -> Option<TicketLayout> {
        self.pending.as_ref().map(|b| self.layout.layout(b, true))
    }

    pub async fn nudge(&mut self, nudge: LayoutNudge) -> SyncResult<PrintSettings> {
        self.layout.adjust(nudge).await
    }

    pub async fn reset_layout(&mut self) -> SyncResult<PrintSettings> {
        self.layout.reset().await
    }

    /// Drops the preview. The cart, phone and payment mode stay.
    pub fn cancel(&mut self) -> SyncResult<()> {
        self.state = self.state.apply(RegisterAction::Cancel)?;
        if let Some(bundle) = self.pending.take() {
            debug!(transaction_id = %bundle.transaction_id(), "Preview cancelled");
        }
        Ok(())
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Prints the previewed bundle and hands persistence to the background.
    ///
    /// The cart, phone and payment mode are cleared.
    pub async fn confirm(&mut self) -> SyncResult<Submission> {
        let next = self.state.apply(RegisterAction::Confirm)?;
        let bundle = self.pending.take().ok_or(CoreError::NoBundle)?;
        self.state = next;

        let plan = LoyaltyPlan::for_bundle(&bundle);
        let submission = self.commit(bundle, plan).await?;

        self.cart.clear();
        self.phone = None;
        self.payment_mode = None;
        Ok(submission)
    }

    /// Prints the last bundle again under a new transaction identity.
    ///
    /// Loyalty is never settled for a reprint.
    pub async fn reprint(&mut self) -> SyncResult<Submission> {
        let next = self.state.apply(RegisterAction::Reprint)?;
        let original = self.printed.as_ref().ok_or(CoreError::NoBundle)?;

        let now = Utc::now();
        let bundle = reprint::reprint(original, &TransactionId::generate(now), now);
        info!(
            original = %original.transaction_id(),
            transaction_id = %bundle.transaction_id(),
            "Reprinting"
        );
        self.state = next;

        self.commit(bundle, None).await
    }

    /// Leaves `Settled` for the next sale.
    pub fn done(&mut self) -> SyncResult<()> {
        self.state = self.state.apply(RegisterAction::Done)?;
        Ok(())
    }

    /// Journal, print, settle, then spawn persistence. Runs in `Committing`.
    async fn commit(&mut self, bundle: TicketBundle, plan: Option<LoyaltyPlan>) -> SyncResult<Submission> {
        if let Err(e) = self.journal.record(&bundle).await {
            warn!(
                transaction_id = %bundle.transaction_id(),
                error = %e,
                "Failed to journal bundle, printing anyway"
            );
        }

        let layout = self.layout.layout(&bundle, false);
        self.printer.print(&layout);
        self.state = self.state.apply(RegisterAction::PrintFired)?;

        let sync = self.sync.clone();
        let background = bundle.clone();
        let task = tokio::spawn(async move { sync.persist(background, plan).await });

        self.printed = Some(bundle.clone());
        Ok(Submission {
            bundle,
            layout,
            task,
        })
    }

    // =========================================================================
    // Loyalty Lookup
    // =========================================================================

    /// Points balance for the entered phone. `None` without a valid phone or
    /// when the lookup fails.
    pub async fn lookup_points(&self) -> Option<i64> {
        let phone = self.phone.as_deref().filter(|p| is_loyalty_phone(p))?;
        match self.loyalty.lookup(phone).await {
            Ok(balance) => Some(balance.points),
            Err(e) => {
                warn!(error = %e, "Loyalty lookup failed");
                None
            }
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Register`].
pub struct RegisterBuilder {
    catalog: Catalog,
    issuer: Issuer,
    layout: Option<PrintLayoutController>,
    sync: Option<SyncHandle>,
    loyalty: Option<Arc<dyn LoyaltyService>>,
    journal: Option<Arc<dyn TicketJournal>>,
    printer: Option<Arc<dyn TicketPrinter>>,
}

impl RegisterBuilder {
    pub fn new(issuer: Issuer) -> Self {
        RegisterBuilder {
            catalog: Catalog::default(),
            issuer,
            layout: None,
            sync: None,
            loyalty: None,
            journal: None,
            printer: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_layout(mut self, layout: PrintLayoutController) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_sync(mut self, sync: SyncHandle) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn with_loyalty(mut self, loyalty: Arc<dyn LoyaltyService>) -> Self {
        self.loyalty = Some(loyalty);
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn TicketJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_printer(mut self, printer: Arc<dyn TicketPrinter>) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn build(self) -> SyncResult<Register> {
        let missing = |what: &str| SyncError::InvalidConfig(format!("{what} required"));

        Ok(Register {
            catalog: self.catalog,
            cart: Cart::new(),
            state: RegisterState::Idle,
            phone: None,
            payment_mode: None,
            issuer: self.issuer,
            layout: self.layout.ok_or_else(|| missing("Print layout"))?,
            pending: None,
            printed: None,
            sync: self.sync.ok_or_else(|| missing("Sync handle"))?,
            loyalty: self.loyalty.ok_or_else(|| missing("Loyalty service"))?,
            journal: self.journal.ok_or_else(|| missing("Ticket journal"))?,
            printer: self.printer.ok_or_else(|| missing("Printer"))?,
        })
    }
}
