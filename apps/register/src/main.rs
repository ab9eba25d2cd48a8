//! # RidePass Register Entry Point
//!
//! Headless ticket register. Reads operator commands from stdin, prints
//! replies and status events to stdout, logs to stderr.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize logging (RUST_LOG, default info,ridepass=debug)         │
//! │  2. Load terminal.toml + RIDEPASS_* overrides                          │
//! │  3. Open SQLite (settings, pending queue, journal) + migrations        │
//! │  4. Build HTTP collaborators, fetch the catalog (empty if offline)     │
//! │  5. Restore the durable queue, drain once if online                    │
//! │  6. Start the connectivity monitor                                     │
//! │  7. Command loop until `quit`, EOF or Ctrl-C                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod command;
mod emitter;
mod error;

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ridepass_core::{Catalog, ComboPolicy};
use ridepass_db::{Database, DbConfig};
use ridepass_sync::{
    CatalogService, ConnectivityMonitor, HttpApi, PrintLayoutController, Register,
    RegisterBuilder, SettingsQueue, SettingsStore, SpoolPrinter, SyncHandle, TerminalConfig,
    TicketService,
};

use command::Command;
use emitter::StdoutEmitter;
use error::OperatorError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting RidePass register");

    let config = TerminalConfig::load_or_default(std::env::args_os().nth(1).map(Into::into));
    info!(
        terminal = %config.terminal.name,
        api = %config.api.base_url,
        policy = %config.bad_request_policy(),
        "Terminal configuration loaded"
    );

    let db_path = TerminalConfig::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(?db_path, "Database path determined");
    let db = Arc::new(Database::new(DbConfig::new(db_path)).await?);

    let api = Arc::new(HttpApi::from_config(&config)?);
    let store: Arc<dyn SettingsStore> = db.clone();

    let sync = SyncHandle::builder(
        api.clone(),
        api.clone(),
        Arc::new(SettingsQueue::new(store.clone())),
        config.bad_request_policy(),
    )
    .with_emitter(Arc::new(StdoutEmitter))
    .build();

    // Restore the count while still offline; coming online below drains it.
    sync.resume().await?;
    sync.set_online(api.probe().await).await;

    let catalog = load_catalog(api.as_ref()).await;

    let mut register = RegisterBuilder::new(config.issuer())
        .with_catalog(catalog)
        .with_layout(PrintLayoutController::load(store).await?)
        .with_sync(sync.clone())
        .with_loyalty(api.clone())
        .with_journal(db.clone())
        .with_printer(Arc::new(SpoolPrinter::new(
            config.spool_dir(),
            config.printer.paper_width_chars,
        )))
        .build()?;

    let monitor = ConnectivityMonitor::new(api.clone(), sync, config.probe_interval()).start();

    command_loop(&mut register, config.printer.paper_width_chars).await?;

    monitor.shutdown().await;
    db.close().await;
    info!("Register stopped");
    Ok(())
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=ridepass_sync=trace` - Trace the orchestrator only
/// - Default: `info,ridepass=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ridepass=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Products from the catalog endpoint, or an empty catalog when unreachable.
async fn load_catalog(api: &HttpApi) -> Catalog {
    match api.fetch_products().await {
        Ok(products) => {
            let catalog = Catalog::load(products, &ComboPolicy::default());
            info!(products = catalog.len(), "Catalog loaded");
            catalog
        }
        Err(e) => {
            warn!(error = %e, "Catalog unavailable, starting with an empty catalog");
            Catalog::default()
        }
    }
}

async fn command_loop(register: &mut Register, paper_width_chars: usize) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let cmd = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(cmd) => cmd,
            Err(e) => {
                println!("error {}", OperatorError::from(e));
                continue;
            }
        };

        match command::execute(register, cmd, paper_width_chars).await {
            Ok(reply) => println!("{reply}"),
            Err(e) => println!("error {e}"),
        }
    }
    Ok(())
}
