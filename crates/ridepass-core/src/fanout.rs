//! # Ticket Fan-Out Engine
//!
//! Pure transformation from a cart into a [`TicketBundle`]: one master
//! summary plus one physical, individually scannable ticket per admission.
//!
//! ## Fan-Out Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart                                  Sub-tickets (print order)        │
//! │  ─────────────────────────────         ───────────────────────────────  │
//! │  COMBO     ₹500 × 1  (Flat)     ──►    TXN-…-C1 … TXN-…-C6  @ ₹100      │
//! │  TL TRAIN  ₹50  × 2  (PerUnit)  ──►    TXN-…-R7, TXN-…-R8   @ ₹50       │
//! │                                                                         │
//! │  Master: TXN-…  amount ₹600 (Σ unit_price × quantity)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter `n` runs across the whole bundle, so ids are unique within the
//! bundle and scan order matches print order. Combo sub-tickets are printed at
//! a flat rate, so the sub-ticket amounts do not have to add up to the master
//! amount.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    CartLine, FanOutRule, Issuer, PaymentMode, TicketBundle, TicketKind, TicketRecord,
    TicketStatus, TransactionId,
};
use crate::{COMBO_SUB_TICKET_PRICE_MAJOR, COMBO_TICKETS_PER_UNIT};

/// Everything besides the cart that a checkout needs.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub transaction_id: TransactionId,
    pub issued_at: DateTime<Utc>,
    pub phone: Option<String>,
    pub payment_mode: PaymentMode,
    pub issuer: Issuer,
}

/// Flat price printed on each combo sub-ticket.
pub const fn combo_sub_ticket_price() -> Money {
    Money::from_major(COMBO_SUB_TICKET_PRICE_MAJOR)
}

/// Builds the bundle for `lines`. Declines an empty cart.
pub fn fan_out(lines: &[CartLine], ctx: &CheckoutContext) -> CoreResult<TicketBundle> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let master = TicketRecord {
        id: ctx.transaction_id.to_string(),
        amount: lines.iter().map(CartLine::line_total).sum(),
        items: lines.to_vec(),
        phone: ctx.phone.clone(),
        payment_mode: ctx.payment_mode,
        issued_by: ctx.issuer.display_name(),
        issued_at: ctx.issued_at,
        status: TicketStatus::Valid,
        is_sub_ticket: false,
        parent_id: None,
    };

    let mut sub_tickets = Vec::with_capacity(admission_count(lines));
    let mut counter: u32 = 0;

    for line in lines {
        let (copies, item) = match line.fan_out {
            FanOutRule::Flat => (
                line.quantity * COMBO_TICKETS_PER_UNIT,
                CartLine {
                    product_ref: line.product_ref.clone(),
                    display_name: combo_ticket_label(&line.display_name),
                    unit_price: combo_sub_ticket_price(),
                    quantity: 1,
                    fan_out: FanOutRule::Flat,
                },
            ),
            FanOutRule::PerUnit => (
                line.quantity,
                CartLine {
                    quantity: 1,
                    ..line.clone()
                },
            ),
        };
        let kind = TicketKind::for_rule(line.fan_out);

        for _ in 0..copies {
            counter += 1;
            sub_tickets.push(TicketRecord {
                id: ctx.transaction_id.sub_ticket_id(kind, counter),
                amount: item.unit_price,
                items: vec![item.clone()],
                phone: ctx.phone.clone(),
                payment_mode: ctx.payment_mode,
                issued_by: master.issued_by.clone(),
                issued_at: ctx.issued_at,
                status: TicketStatus::Valid,
                is_sub_ticket: true,
                parent_id: Some(master.id.clone()),
            });
        }
    }

    Ok(TicketBundle {
        master,
        sub_tickets,
    })
}

/// Number of sub-tickets `lines` will produce.
pub fn admission_count(lines: &[CartLine]) -> usize {
    lines
        .iter()
        .map(|l| match l.fan_out {
            FanOutRule::Flat => l.quantity * COMBO_TICKETS_PER_UNIT,
            FanOutRule::PerUnit => l.quantity,
        })
        .sum::<i64>()
        .max(0) as usize
}

/// Label printed on a combo admission: upper-cased, with "(5 Rides)" corrected
/// to "(6 Rides)".
pub fn combo_ticket_label(name: &str) -> String {
    let upper = name.to_uppercase();
    let mut out = String::with_capacity(upper.len());
    let mut rest = upper.as_str();

    while let Some(start) = rest.find("(5") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let trimmed = after.trim_start();
        if let Some(tail) = trimmed.strip_prefix("RIDES)") {
            out.push_str("(6 RIDES)");
            rest = tail;
        } else {
            out.push_str("(5");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
