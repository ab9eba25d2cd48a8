//! # ridepass-sync: Register Orchestration for RidePass
//!
//! Everything in RidePass that waits on something: the printer, the local
//! database, the venue API and the network. Pure rules live in
//! `ridepass-core`; this crate sequences them.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Orchestration                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  Register (one per terminal)                     │  │
//! │  │                                                                  │  │
//! │  │  cart ─► checkout ─► preview ─► confirm ─► journal ─► print      │  │
//! │  │                         ▲                              │         │  │
//! │  │             PrintLayoutController                spawn persist   │  │
//! │  └──────────────────────────────────────────────────────┬───────────┘  │
//! │                                                         │              │
//! │         ┌───────────────────────────────────────────────┘              │
//! │         ▼                                                              │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  SyncHandle    │  │ DurableQueue   │  │ ConnectivityMonitor    │    │
//! │  │                │  │                │  │                        │    │
//! │  │ submit batch   │─►│ pending_tickets│◄─│ probe on interval      │    │
//! │  │ settle loyalty │  │ in local DB    │  │ off→on triggers drain  │    │
//! │  │ 400 policy     │  │                │  │                        │    │
//! │  └───────┬────────┘  └────────────────┘  └────────────────────────┘    │
//! │          │                                                             │
//! │          ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  HttpApi: TicketService + LoyaltyService + CatalogService       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  STATUS EVENTS (RegisterEventEmitter):                                 │
//! │  • status  - online flag, pending count, draining                      │
//! │  • drain   - outcome of each drain attempt                             │
//! │  • error   - swallowed background failures                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`register`] - The `Register` orchestrator and its builder
//! - [`submission`] - Background persistence, drain and loyalty settlement
//! - [`queue`] - Durable queue of unsubmitted ticket records
//! - [`layout`] - Persisted print layout adjustments
//! - [`connectivity`] - Reachability probing
//! - [`client`] - Remote collaborator traits and the HTTP implementation
//! - [`store`] - Key-value settings persistence seam
//! - [`journal`] - Local audit trail of printed bundles
//! - [`printer`] - Printer seam and the spool-directory printer
//! - [`events`] - Status events for the front end
//! - [`config`] - Terminal configuration
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ridepass_sync::{HttpApi, RegisterBuilder, SettingsQueue, SyncHandle, TerminalConfig};
//!
//! let config = TerminalConfig::load_or_default(None);
//! let api = Arc::new(HttpApi::from_config(&config)?);
//! let sync = SyncHandle::new(api.clone(), api.clone(), queue, config.bad_request_policy());
//!
//! let mut register = RegisterBuilder::new(config.issuer())
//!     .with_sync(sync)
//!     // ...
//!     .build()?;
//!
//! register.add_item("19", 1)?;
//! let preview = register.checkout()?;
//! let submission = register.confirm().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod events;
pub mod journal;
pub mod layout;
pub mod printer;
pub mod queue;
pub mod register;
pub mod store;
pub mod submission;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{CatalogService, HttpApi, LoyaltyBalance, LoyaltyService, TicketService};
pub use config::{BadRequestPolicy, TerminalConfig};
pub use connectivity::{ConnectivityHandle, ConnectivityMonitor};
pub use error::{SubmitError, SyncError, SyncResult};
pub use events::{NoOpEmitter, RegisterEventEmitter, RegisterStatus};
pub use journal::TicketJournal;
pub use layout::{LayoutNudge, PrintLayoutController};
pub use printer::{SpoolPrinter, TicketPrinter};
pub use queue::{DurableQueue, SettingsQueue};
pub use register::{Register, RegisterBuilder, Submission};
pub use store::{MemorySettingsStore, SettingsStore};
pub use submission::{
    DrainOutcome, LoyaltySettlement, SkipReason, SubmissionOutcome, SyncHandle, SyncHandleBuilder,
};
