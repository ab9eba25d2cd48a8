//! Local audit trail of printed bundles.

use async_trait::async_trait;

use ridepass_core::TicketBundle;
use ridepass_db::Database;

use crate::error::SyncResult;

/// Records every bundle handed to the printer.
#[async_trait]
pub trait TicketJournal: Send + Sync {
    async fn record(&self, bundle: &TicketBundle) -> SyncResult<()>;
}

#[async_trait]
impl TicketJournal for Database {
    async fn record(&self, bundle: &TicketBundle) -> SyncResult<()> {
        Ok(self.journal().record_bundle(bundle).await?)
    }
}
