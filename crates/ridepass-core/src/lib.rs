//! # ridepass-core: Pure Business Logic for RidePass
//!
//! This crate is the **heart** of RidePass. It turns a register cart into
//! printable, individually scannable ride tickets, and holds every rule that
//! decides what gets printed, what gets persisted and what earns points.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RidePass Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register (apps/register)                        │   │
//! │  │    Ride grid ──► Cart ──► Preview ──► Print ──► Reprint         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        ridepass-sync (orchestrator, offline queue)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ridepass-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐  │   │
//! │  │  │ catalog │ │  cart   │ │ fanout  │ │ reprint │ │  layout  │  │   │
//! │  │  │ Combo   │ │CartLine │ │ Bundle  │ │ fresh   │ │ settings │  │   │
//! │  │  │ policy  │ │ limits  │ │ C/R ids │ │ ids     │ │ render   │  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (paise, no floats)
//! - [`types`] - Products, cart lines, ticket records, bundles
//! - [`catalog`] - Product catalog with combo fan-out classification
//! - [`cart`] - The register cart
//! - [`fanout`] - Cart → master record + sub-tickets
//! - [`reprint`] - Fresh-identity reprints
//! - [`loyalty`] - Points rules and the settlement plan
//! - [`layout`] - Print settings and the ticket render projection
//! - [`session`] - Register state machine
//! - [`validation`] - Input validation at the register boundary
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use ridepass_core::{
//!     fanout, Cart, Catalog, CheckoutContext, ComboPolicy, Issuer, Money, PaymentMode,
//!     Product, TransactionId,
//! };
//!
//! let catalog = Catalog::load(
//!     vec![
//!         Product::new("19", "COMBO", Money::from_major(500)),
//!         Product::new("4", "TL TRAIN", Money::from_major(50)),
//!     ],
//!     &ComboPolicy::default(),
//! );
//!
//! let mut cart = Cart::new();
//! cart.add_product(catalog.get("19").unwrap(), 1).unwrap();
//! cart.add_product(catalog.get("4").unwrap(), 2).unwrap();
//!
//! let now = Utc::now();
//! let ctx = CheckoutContext {
//!     transaction_id: TransactionId::generate(now),
//!     issued_at: now,
//!     phone: None,
//!     payment_mode: PaymentMode::Cash,
//!     issuer: Issuer::named("Asha"),
//! };
//!
//! let bundle = fanout::fan_out(cart.lines(), &ctx).unwrap();
//! assert_eq!(bundle.master.amount, Money::from_major(600));
//! assert_eq!(bundle.sub_tickets.len(), 8);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod fanout;
pub mod layout;
pub mod loyalty;
pub mod money;
pub mod reprint;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use catalog::{Catalog, CatalogItem, ComboPolicy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fanout::CheckoutContext;
pub use layout::{PrintSettings, TicketLayout, TicketPage};
pub use loyalty::{LoyaltyPlan, REWARD_PRODUCT_REF};
pub use money::Money;
pub use session::{RegisterAction, RegisterState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// Guards against typing 1000 instead of 10 and then printing a thousand
/// physical tickets.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Sub-tickets printed per unit of a combo pass.
pub const COMBO_TICKETS_PER_UNIT: i64 = 6;

/// Flat price stamped on each combo sub-ticket, in major currency units.
pub const COMBO_SUB_TICKET_PRICE_MAJOR: i64 = 100;
