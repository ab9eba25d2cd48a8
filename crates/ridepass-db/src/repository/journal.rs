//! # Ticket Journal Repository
//!
//! The terminal's own audit trail of every bundle handed to the printer,
//! independent of whether remote persistence ever succeeds.
//!
//! ## Journal Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  confirm / reprint                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  INSERT master     (kind 'master', parent_id NULL)              │   │
//! │  │  INSERT sub-ticket (kind 'C'|'R',  parent_id = master id) × N   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  printer fires                                                         │
//! │                                                                         │
//! │  gate scanner ──► set_status(id, used | invalid)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use ridepass_core::{Money, TicketBundle, TicketRecord, TicketStatus};

/// Journal kind of a master record.
pub const MASTER_KIND: &str = "master";

/// One journaled ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub id: String,
    pub parent_id: Option<String>,
    /// `master`, `C` or `R`.
    pub kind: String,
    pub amount: Money,
    pub status: TicketStatus,
    pub issued_at: DateTime<Utc>,
    /// The record as printed, with `status` reflecting the current column.
    pub record: TicketRecord,
}

#[derive(Debug, sqlx::FromRow)]
struct JournalRow {
    id: String,
    parent_id: Option<String>,
    kind: String,
    amount_paise: i64,
    status: String,
    payload: String,
    issued_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = DbError;

    fn try_from(row: JournalRow) -> DbResult<Self> {
        let status = TicketStatus::parse(&row.status)
            .ok_or_else(|| DbError::corrupt("issued_tickets", format!("status '{}'", row.status)))?;
        let mut record: TicketRecord = serde_json::from_str(&row.payload)?;
        record.status = status;

        Ok(JournalEntry {
            id: row.id,
            parent_id: row.parent_id,
            kind: row.kind,
            amount: Money::from_paise(row.amount_paise),
            status,
            issued_at: row.issued_at,
            record,
        })
    }
}

fn journal_kind(record: &TicketRecord) -> String {
    match record.kind() {
        Some(kind) => kind.tag().to_string(),
        None if record.is_sub_ticket => "R".to_string(),
        None => MASTER_KIND.to_string(),
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, parent_id, kind, amount_paise, status, payload, issued_at FROM issued_tickets";

/// Repository for `issued_tickets`.
#[derive(Debug, Clone)]
pub struct TicketJournalRepository {
    pool: SqlitePool,
}

impl TicketJournalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TicketJournalRepository { pool }
    }

    /// Records the master and every sub-ticket atomically.
    ///
    /// Recording the same bundle twice fails with `UniqueViolation` and
    /// leaves the journal unchanged.
    pub async fn record_bundle(&self, bundle: &TicketBundle) -> DbResult<()> {
        debug!(
            transaction_id = %bundle.transaction_id(),
            sub_tickets = bundle.sub_tickets.len(),
            "Journaling bundle"
        );

        let recorded_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        for record in bundle.records() {
            let payload = serde_json::to_string(record)?;
            sqlx::query(
                r#"
                INSERT INTO issued_tickets (
                    id, parent_id, kind, amount_paise, status,
                    payload, issued_at, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&record.id)
            .bind(&record.parent_id)
            .bind(journal_kind(record))
            .bind(record.amount.paise())
            .bind(record.status.as_str())
            .bind(payload)
            .bind(record.issued_at)
            .bind(recorded_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<JournalEntry>> {
        let row: Option<JournalRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JournalEntry::try_from).transpose()
    }

    /// Sub-tickets of `parent_id` in print order.
    pub async fn list_by_parent(&self, parent_id: &str) -> DbResult<Vec<JournalEntry>> {
        let rows: Vec<JournalRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE parent_id = ?1 ORDER BY rowid"))
                .bind(parent_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(JournalEntry::try_from).collect()
    }

    /// Marks a ticket used or invalid.
    pub async fn set_status(&self, id: &str, status: TicketStatus) -> DbResult<()> {
        debug!(id = %id, status = status.as_str(), "Updating ticket status");

        let result = sqlx::query("UPDATE issued_tickets SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ticket", id));
        }
        Ok(())
    }

    /// Total journaled rows (masters and sub-tickets).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM issued_tickets")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
