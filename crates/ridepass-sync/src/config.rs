//! # Terminal Configuration
//!
//! Configuration management for one register terminal.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RIDEPASS_API_URL=https://api.example.com                           │
//! │     RIDEPASS_ISSUER_NAME=Asha                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/ridepass-register/terminal.toml (Linux)                  │
//! │     ~/Library/Application Support/com.ridepass.register/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost API, generated terminal id, reset-queue policy           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [terminal]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Gate Register 2"
//!
//! [issuer]
//! name = "Asha"
//! email = "pos2@venue.example"
//! role = "pos"
//!
//! [api]
//! base_url = "https://api.venue.example"
//! timeout_secs = 10
//!
//! [connectivity]
//! probe_interval_secs = 15
//!
//! [queue]
//! bad_request_policy = "reset_queue"  # reset_queue | drop_batch
//!
//! [printer]
//! spool_dir = "/var/spool/ridepass"
//! paper_width_chars = 32
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use ridepass_core::Issuer;

use crate::error::{SyncError, SyncResult};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "ridepass";
const APPLICATION: &str = "register";

// =============================================================================
// Bad Request Policy
// =============================================================================

/// What to do when the ticket service rejects a fresh submission with 400.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  RESET_QUEUE (Default)              │  DROP_BATCH                       │
/// │  ─────────────────────              │  ──────────                       │
/// │  • Rejected batch is dropped        │  • Rejected batch is dropped      │
/// │  • Whole local queue is cleared     │  • Local queue is left alone      │
/// │  • Pending count goes to 0          │  • Pending count unchanged        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRequestPolicy {
    #[default]
    ResetQueue,
    DropBatch,
}

impl std::fmt::Display for BadRequestPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadRequestPolicy::ResetQueue => write!(f, "reset_queue"),
            BadRequestPolicy::DropBatch => write!(f, "drop_batch"),
        }
    }
}

impl std::str::FromStr for BadRequestPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "reset_queue" | "reset" => Ok(BadRequestPolicy::ResetQueue),
            "drop_batch" | "drop" => Ok(BadRequestPolicy::DropBatch),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown bad request policy: '{}'. Valid options: reset_queue, drop_batch",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Identity of this terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Generated on first run if not provided.
    #[serde(default = "generate_terminal_id")]
    pub id: String,

    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn generate_terminal_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_terminal_name() -> String {
    "Register".to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            id: generate_terminal_id(),
            name: default_terminal_name(),
        }
    }
}

/// The signed-in operator. Authentication happens elsewhere; the register
/// only prints the name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuerSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoints live under `/api/...`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token of the established operator session.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivitySettings {
    /// Interval between health probes (seconds).
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
}

fn default_probe_interval() -> u64 {
    15
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        ConnectivitySettings {
            probe_interval_secs: default_probe_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default)]
    pub bad_request_policy: BadRequestPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterSettings {
    /// Where print jobs are written. Defaults to `spool/` under the
    /// platform data directory.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// Characters per line at scale 1.0 (32 fits 58mm thermal paper).
    #[serde(default = "default_paper_width")]
    pub paper_width_chars: usize,
}

fn default_paper_width() -> usize {
    32
}

impl Default for PrinterSettings {
    fn default() -> Self {
        PrinterSettings {
            spool_dir: None,
            paper_width_chars: default_paper_width(),
        }
    }
}

// =============================================================================
// Main Terminal Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub issuer: IssuerSettings,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub connectivity: ConnectivitySettings,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default)]
    pub printer: PrinterSettings,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("terminal.id must not be empty".into()));
        }

        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.connectivity.probe_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "connectivity.probe_interval_secs must be greater than 0".into(),
            ));
        }

        if self.printer.paper_width_chars < ridepass_core::layout::MIN_TEXT_WIDTH {
            return Err(SyncError::InvalidConfig(format!(
                "printer.paper_width_chars must be at least {}",
                ridepass_core::layout::MIN_TEXT_WIDTH
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `RIDEPASS_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("RIDEPASS_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Some(name) = lookup("RIDEPASS_TERMINAL_NAME") {
            self.terminal.name = name;
        }

        if let Some(name) = lookup("RIDEPASS_ISSUER_NAME") {
            self.issuer.name = Some(name);
        }

        if let Some(email) = lookup("RIDEPASS_ISSUER_EMAIL") {
            self.issuer.email = Some(email);
        }

        if let Some(url) = lookup("RIDEPASS_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = lookup("RIDEPASS_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Some(secs) = lookup("RIDEPASS_API_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid RIDEPASS_API_TIMEOUT_SECS"),
            }
        }

        if let Some(secs) = lookup("RIDEPASS_PROBE_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.connectivity.probe_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid RIDEPASS_PROBE_INTERVAL_SECS"),
            }
        }

        if let Some(policy) = lookup("RIDEPASS_BAD_REQUEST_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.queue.bad_request_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown bad request policy in environment"),
            }
        }

        if let Some(dir) = lookup("RIDEPASS_SPOOL_DIR") {
            self.printer.spool_dir = Some(PathBuf::from(dir));
        }

        if let Some(width) = lookup("RIDEPASS_PAPER_WIDTH") {
            if let Ok(w) = width.parse::<usize>() {
                self.printer.paper_width_chars = w;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// SQLite file: `RIDEPASS_DB_PATH`, else the platform data directory.
    pub fn database_path() -> PathBuf {
        if let Ok(path) = std::env::var("RIDEPASS_DB_PATH") {
            return PathBuf::from(path);
        }
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.data_dir().join("ridepass.db"))
            .unwrap_or_else(|| PathBuf::from("ridepass.db"))
    }

    /// Resolved spool directory.
    pub fn spool_dir(&self) -> PathBuf {
        if let Some(dir) = &self.printer.spool_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.data_dir().join("spool"))
            .unwrap_or_else(|| PathBuf::from("spool"))
    }

    pub fn issuer(&self) -> Issuer {
        Issuer {
            name: self.issuer.name.clone(),
            email: self.issuer.email.clone(),
            role: self.issuer.role.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity.probe_interval_secs)
    }

    pub fn bad_request_policy(&self) -> BadRequestPolicy {
        self.queue.bad_request_policy
    }
}
