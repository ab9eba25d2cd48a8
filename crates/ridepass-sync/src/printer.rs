//! # Printer
//!
//! The register fires a print and moves on; nothing reports back whether
//! paper came out.

use std::path::PathBuf;
use tracing::{error, info};

use ridepass_core::TicketLayout;

use crate::error::SyncResult;

/// Physical output. Fire-and-forget.
pub trait TicketPrinter: Send + Sync {
    fn print(&self, layout: &TicketLayout);
}

/// Writes each job as plain text to `<spool_dir>/<transaction id>.txt`,
/// where a line-printer daemon picks it up.
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
    paper_width_chars: usize,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>, paper_width_chars: usize) -> Self {
        SpoolPrinter {
            dir: dir.into(),
            paper_width_chars,
        }
    }

    pub fn job_path(&self, transaction_id: &str) -> PathBuf {
        self.dir.join(format!("{transaction_id}.txt"))
    }

    fn write_job(&self, layout: &TicketLayout) -> SyncResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.job_path(&layout.transaction_id);
        std::fs::write(&path, layout.to_text(self.paper_width_chars))?;
        Ok(path)
    }
}

impl TicketPrinter for SpoolPrinter {
    fn print(&self, layout: &TicketLayout) {
        match self.write_job(layout) {
            Ok(path) => info!(
                transaction_id = %layout.transaction_id,
                pages = layout.pages.len(),
                ?path,
                "Print job spooled"
            ),
            Err(e) => error!(
                transaction_id = %layout.transaction_id,
                error = %e,
                "Failed to spool print job"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ridepass_core::fanout::{fan_out, CheckoutContext};
    use ridepass_core::layout::render;
    use ridepass_core::{
        CartLine, FanOutRule, Issuer, Money, PaymentMode, PrintSettings, TransactionId,
    };

    fn layout() -> TicketLayout {
        let lines = vec![CartLine {
            product_ref: "4".into(),
            display_name: "TL TRAIN".into(),
            unit_price: Money::from_major(50),
            quantity: 2,
            fan_out: FanOutRule::PerUnit,
        }];
        let now = Utc::now();
        let bundle = fan_out(
            &lines,
            &CheckoutContext {
                transaction_id: TransactionId::generate(now),
                issued_at: now,
                phone: None,
                payment_mode: PaymentMode::Cash,
                issuer: Issuer::named("Asha"),
            },
        )
        .unwrap();
        render(&bundle, &PrintSettings::default(), false)
    }

    #[test]
    fn test_spool_writes_one_file_per_job() {
        let dir = tempfile::tempdir().unwrap();
        let printer = SpoolPrinter::new(dir.path().join("spool"), 32);
        let layout = layout();

        printer.print(&layout);

        let text = std::fs::read_to_string(printer.job_path(&layout.transaction_id)).unwrap();
        assert_eq!(text.matches("ADMIT ONE").count(), 2);
        assert!(text.contains("TL TRAIN"));
        assert!(!text.contains("RECEIPT"));
    }

    #[test]
    fn test_spool_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // A regular file where the directory should be.
        let printer = SpoolPrinter::new(&blocker, 32);
        printer.print(&layout());
    }
}
