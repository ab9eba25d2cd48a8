//! # Register State Machine
//!
//! One explicit state replaces the preview/success/processing flags a modal
//! UI would juggle.
//!
//! ```text
//!            EditCart                         PrintFired
//!           ┌────────┐                     ┌─────────────┐
//!           ▼        │                     │             ▼
//!        ┌──────┐ Checkout ┌────────────────┐ Confirm ┌────────────┐     ┌─────────┐
//!        │ Idle │─────────►│AwaitingConfirm │────────►│ Committing │────►│ Settled │
//!        └──────┘          └────────────────┘         └────────────┘     └─────────┘
//!           ▲                      │ Cancel                  ▲              │  │
//!           └──────────────────────┘                         │   Reprint    │  │
//!           ▲                                                └──────────────┘  │
//!           └───────────────────────── Done / EditCart ────────────────────────┘
//! ```
//!
//! `AwaitingConfirm` is the only cancellable state. Once confirmed, printing
//! and persistence run to completion.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum RegisterState {
    /// Building the cart.
    Idle,
    /// Bundle produced, preview shown.
    AwaitingConfirm,
    /// Print is being fired; persistence is handed to the background.
    Committing,
    /// Paper is out. The bundle is kept for reprint.
    Settled,
}

impl Default for RegisterState {
    fn default() -> Self {
        RegisterState::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
    EditCart,
    Checkout,
    Confirm,
    Cancel,
    PrintFired,
    Reprint,
    Done,
}

impl RegisterState {
    /// The transition table. Every (state, action) pair is listed.
    pub fn apply(self, action: RegisterAction) -> CoreResult<RegisterState> {
        use RegisterAction as A;
        use RegisterState as S;

        let next = match (self, action) {
            (S::Idle, A::EditCart) => S::Idle,
            (S::Idle, A::Checkout) => S::AwaitingConfirm,
            (S::Idle, A::Confirm | A::Cancel | A::PrintFired | A::Reprint | A::Done) => {
                return Err(self.refuse(action))
            }

            (S::AwaitingConfirm, A::Confirm) => S::Committing,
            (S::AwaitingConfirm, A::Cancel) => S::Idle,
            (
                S::AwaitingConfirm,
                A::EditCart | A::Checkout | A::PrintFired | A::Reprint | A::Done,
            ) => return Err(self.refuse(action)),

            (S::Committing, A::PrintFired) => S::Settled,
            (
                S::Committing,
                A::EditCart | A::Checkout | A::Confirm | A::Cancel | A::Reprint | A::Done,
            ) => return Err(self.refuse(action)),

            (S::Settled, A::Reprint) => S::Committing,
            (S::Settled, A::Done | A::EditCart) => S::Idle,
            (S::Settled, A::Checkout | A::Confirm | A::Cancel | A::PrintFired) => {
                return Err(self.refuse(action))
            }
        };
        Ok(next)
    }

    pub fn allows(self, action: RegisterAction) -> bool {
        self.apply(action).is_ok()
    }

    fn refuse(self, action: RegisterAction) -> CoreError {
        CoreError::InvalidTransition {
            state: self,
            action,
        }
    }
}

impl fmt::Display for RegisterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegisterState::Idle => "idle",
            RegisterState::AwaitingConfirm => "awaiting confirmation",
            RegisterState::Committing => "committing",
            RegisterState::Settled => "settled",
        })
    }
}

impl fmt::Display for RegisterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegisterAction::EditCart => "edit cart",
            RegisterAction::Checkout => "check out",
            RegisterAction::Confirm => "confirm",
            RegisterAction::Cancel => "cancel",
            RegisterAction::PrintFired => "finish printing",
            RegisterAction::Reprint => "reprint",
            RegisterAction::Done => "finish",
        })
    }
}
