//! # Register Events
//!
//! Status updates pushed to whatever front end hosts the register: the
//! offline indicator, the pending-count badge and drain results.

use serde::{Deserialize, Serialize};

use crate::submission::DrainOutcome;

/// What the operator's status bar shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStatus {
    pub online: bool,
    /// Records waiting in the durable queue.
    pub pending_count: usize,
    pub draining: bool,
    /// Most recent swallowed failure, for diagnostics only.
    pub last_error: Option<String>,
}

/// Receives status changes.
///
/// Implementations must not block: events are emitted from background
/// submission tasks.
pub trait RegisterEventEmitter: Send + Sync {
    fn emit_status(&self, status: &RegisterStatus);

    fn emit_drain(&self, outcome: &DrainOutcome);

    /// A failure that was logged and swallowed.
    fn emit_error(&self, message: &str);
}

/// Emitter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEmitter;

impl RegisterEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &RegisterStatus) {}
    fn emit_drain(&self, _outcome: &DrainOutcome) {}
    fn emit_error(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default() {
        let status = RegisterStatus::default();
        assert!(!status.online);
        assert_eq!(status.pending_count, 0);
        assert!(!status.draining);
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_value(RegisterStatus {
            online: true,
            pending_count: 3,
            draining: false,
            last_error: None,
        })
        .unwrap();
        assert_eq!(json["pendingCount"], 3);
    }
}
