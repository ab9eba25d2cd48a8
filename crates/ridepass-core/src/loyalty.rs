//! # Loyalty Rules
//!
//! Points arithmetic and the settlement plan the orchestrator executes after
//! a bundle is persisted. Balances live with the loyalty collaborator; this
//! module only decides which calls to make.
//!
//! ```text
//! total ₹600, phone given ──► earn(phone, ₹600, txn)   → +60 points
//! reward line × 2         ──► redeem(phone, txn) × 2   → −200 points
//! ```

use crate::money::Money;
use crate::types::{CartLine, FanOutRule, TicketBundle};
use crate::validation::is_loyalty_phone;

/// Minimum bundle total that earns points.
pub const EARN_THRESHOLD: Money = Money::from_major(100);

/// Points earned per full [`EARN_BLOCK`] spent.
pub const POINTS_PER_BLOCK: i64 = 10;

/// Spend unit for points.
pub const EARN_BLOCK: Money = Money::from_major(100);

/// Points the loyalty collaborator deducts per redeemed reward.
pub const REDEEM_COST_POINTS: i64 = 100;

/// Product reference of the free reward ride.
pub const REWARD_PRODUCT_REF: &str = "reward-1";

pub const REWARD_DISPLAY_NAME: &str = "Free Priority Ride";

/// floor(total / 100) × 10, never negative.
pub fn points_for(total: Money) -> i64 {
    if total.is_negative() {
        return 0;
    }
    (total.paise() / EARN_BLOCK.paise()) * POINTS_PER_BLOCK
}

/// Points shown on the printed tickets: only when a phone was supplied.
pub fn earned_points(bundle: &TicketBundle) -> Option<i64> {
    bundle.phone().map(|_| points_for(bundle.total()))
}

/// The cart line added by the "reward" action.
pub fn reward_line() -> CartLine {
    CartLine {
        product_ref: REWARD_PRODUCT_REF.to_string(),
        display_name: REWARD_DISPLAY_NAME.to_string(),
        unit_price: Money::zero(),
        quantity: 1,
        fan_out: FanOutRule::PerUnit,
    }
}

/// Total units of the reward line across `lines`.
pub fn reward_units(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .filter(|l| l.product_ref == REWARD_PRODUCT_REF)
        .map(|l| l.quantity)
        .sum()
}

// =============================================================================
// Settlement Plan
// =============================================================================

/// Loyalty calls owed by one persisted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyPlan {
    pub phone: String,
    /// Ticket reference passed to earn and redeem (the master id).
    pub ticket_ref: String,
    /// Amount to earn on, if the total reached the threshold.
    pub earn: Option<Money>,
    /// Number of redeem calls, one per reward unit.
    pub redeem_count: i64,
}

impl LoyaltyPlan {
    /// Returns `None` when the bundle owes no loyalty calls (no valid phone,
    /// nothing to earn, nothing to redeem).
    pub fn for_bundle(bundle: &TicketBundle) -> Option<Self> {
        let phone = bundle.phone().filter(|p| is_loyalty_phone(p))?;

        let total = bundle.total();
        let earn = (total >= EARN_THRESHOLD).then_some(total);
        let redeem_count = reward_units(&bundle.master.items);

        if earn.is_none() && redeem_count == 0 {
            return None;
        }

        Some(Self {
            phone: phone.to_string(),
            ticket_ref: bundle.transaction_id().to_string(),
            earn,
            redeem_count,
        })
    }

    /// Points the earn call should add.
    pub fn expected_points(&self) -> i64 {
        self.earn.map(points_for).unwrap_or(0)
    }
}
