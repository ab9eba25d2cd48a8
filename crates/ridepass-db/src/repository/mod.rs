//! # Repository Module
//!
//! Database repository implementations for the RidePass terminal.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ridepass-sync                                                          │
//! │       │                                                                 │
//! │       │  db.settings().set("print_settings", json)                     │
//! │       │  db.journal().record_bundle(&bundle)                           │
//! │       ▼                                                                 │
//! │  SettingsRepository          TicketJournalRepository                   │
//! │  ├── get(key)                ├── record_bundle(bundle)                 │
//! │  ├── set(key, value)         ├── get(id)                               │
//! │  └── remove(key)             ├── list_by_parent(parent_id)             │
//! │                              ├── set_status(id, status)                │
//! │                              └── count()                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod journal;
pub mod settings;
