//! Status events written to stdout as tagged JSON lines, for a front end
//! wrapping the register process.
//!
//! ```text
//! event register:status {"online":true,"pendingCount":0,...}
//! event register:drain  {"kind":"drained","count":9,"remaining":0}
//! event register:error  {"message":"..."}
//! ```

use serde::Serialize;
use serde_json::json;
use tracing::error;

use ridepass_sync::{DrainOutcome, RegisterEventEmitter, RegisterStatus};

#[derive(Debug, Default)]
pub struct StdoutEmitter;

impl StdoutEmitter {
    fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(body) => println!("event {event} {body}"),
            Err(e) => error!(?e, event, "Failed to encode event"),
        }
    }
}

fn drain_payload(outcome: &DrainOutcome) -> serde_json::Value {
    match outcome {
        DrainOutcome::Drained { count, remaining } => {
            json!({ "kind": "drained", "count": count, "remaining": remaining })
        }
        DrainOutcome::Failed { error, pending } => {
            json!({ "kind": "failed", "error": error, "pending": pending })
        }
        DrainOutcome::Skipped(reason) => {
            json!({ "kind": "skipped", "reason": format!("{reason:?}").to_lowercase() })
        }
    }
}

impl RegisterEventEmitter for StdoutEmitter {
    fn emit_status(&self, status: &RegisterStatus) {
        self.emit("register:status", status);
    }

    fn emit_drain(&self, outcome: &DrainOutcome) {
        self.emit("register:drain", &drain_payload(outcome));
    }

    fn emit_error(&self, message: &str) {
        self.emit("register:error", &json!({ "message": message }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepass_sync::SkipReason;

    #[test]
    fn test_drain_payloads() {
        let drained = drain_payload(&DrainOutcome::Drained {
            count: 9,
            remaining: 0,
        });
        assert_eq!(drained["kind"], "drained");
        assert_eq!(drained["count"], 9);

        let skipped = drain_payload(&DrainOutcome::Skipped(SkipReason::Busy));
        assert_eq!(skipped["reason"], "busy");
    }
}
