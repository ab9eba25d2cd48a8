//! # ridepass-db: Database Layer for RidePass
//!
//! Local SQLite storage for a single register terminal: the key-value
//! settings that hold print layout and the pending ticket queue, and the
//! journal of every ticket the terminal has printed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RidePass Data Flow                               │
//! │                                                                         │
//! │  ridepass-sync (layout controller, durable queue, register)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   ridepass-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ SettingsRepository │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ TicketJournalRepo  │  │ 001, 002   │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite file in the platform data dir (or RIDEPASS_DB_PATH)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ridepass_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("ridepass.db")).await?;
//! db.settings().set("print_settings", &json).await?;
//! db.journal().record_bundle(&bundle).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::journal::{JournalEntry, TicketJournalRepository};
pub use repository::settings::SettingsRepository;
