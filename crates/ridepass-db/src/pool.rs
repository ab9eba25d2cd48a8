//! # Database Pool
//!
//! Opens the register's SQLite file and hands out repositories over one pool.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Register Database                                  │
//! │                                                                         │
//! │  DbConfig::new(path)  or  DbConfig::in_memory()                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← open pool, apply migrations              │
//! │       │                                                                 │
//! │       ├──► db.settings()  ← print settings, pending ticket queue        │
//! │       └──► db.journal()   ← issued ticket audit trail                   │
//! │                                                                         │
//! │  The command loop and background submissions share the pool.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The file is opened in WAL mode so the command loop can read settings
//! while a background submission rewrites the queue.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::journal::TicketJournalRepository;
use crate::repository::settings::SettingsRepository;

/// One register writes at a time; a few connections cover concurrent reads.
const FILE_MAX_CONNECTIONS: u32 = 4;

/// Waiting longer than this for a connection means the file is wedged.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Configuration
// =============================================================================

/// Where the register's database lives.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for tests.
    pub database_path: PathBuf,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
        }
    }

    /// Private in-memory database. Each `Database::new` gets a fresh one.
    pub fn in_memory() -> Self {
        DbConfig::new(":memory:")
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        // NORMAL sync may lose the last write on power loss, never the file.
        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }

    /// An in-memory database exists per connection, so it gets exactly one.
    fn max_connections(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            FILE_MAX_CONNECTIONS
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Database handle. Cheap to clone; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and applies pending migrations.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./ridepass.db")).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening register database");

        let max_connections = config.max_connections();
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections, "Database pool created");

        let db = Database { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Applies pending migrations. Safe to call again on an open database.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Key-value settings: print layout and the pending ticket queue.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Issued ticket journal.
    pub fn journal(&self) -> TicketJournalRepository {
        TicketJournalRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing register database");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_isolated() {
        let first = Database::new(DbConfig::in_memory()).await.unwrap();
        first.settings().set("layout", "{}").await.unwrap();

        let second = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(second.settings().get("layout").await.unwrap(), None);
    }

    #[test]
    fn test_in_memory_uses_single_connection() {
        assert_eq!(DbConfig::in_memory().max_connections(), 1);
        assert_eq!(DbConfig::new("/tmp/ridepass.db").max_connections(), FILE_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ridepass.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.settings().set("pending_tickets", "[]").await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(
            reopened.settings().get("pending_tickets").await.unwrap().as_deref(),
            Some("[]")
        );
    }
}
