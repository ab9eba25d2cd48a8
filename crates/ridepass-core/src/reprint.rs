//! # Reprint Generator
//!
//! A reprint is a new transaction, never a duplicate. The bundle keeps its
//! line items, amounts, phone and payment mode, but every ticket gets a fresh
//! identity so stale or voided tickets cannot be reissued under their old
//! ids.
//!
//! ```text
//! TXN-A          ──►  TXN-B                 (new id, new timestamp)
//! TXN-A-C1…C6    ──►  TXN-B-C1…C6           (kind and index preserved)
//! TXN-A-R7       ──►  TXN-B-R7              (parent_id = TXN-B)
//! ```
//!
//! Loyalty is never consulted for a reprint.

use chrono::{DateTime, Utc};

use crate::types::{SubTicketId, TicketBundle, TicketKind, TicketRecord, TicketStatus, TransactionId};

/// Re-identifies `original` under `transaction_id`, issued at `issued_at`.
pub fn reprint(
    original: &TicketBundle,
    transaction_id: &TransactionId,
    issued_at: DateTime<Utc>,
) -> TicketBundle {
    let master = TicketRecord {
        id: transaction_id.to_string(),
        issued_at,
        status: TicketStatus::Valid,
        ..original.master.clone()
    };

    let sub_tickets = original
        .sub_tickets
        .iter()
        .enumerate()
        .map(|(position, sub)| {
            let (kind, index) = match SubTicketId::parse(&sub.id) {
                Some(parsed) => (parsed.kind, parsed.index),
                None => (fallback_kind(sub), position as u32 + 1),
            };
            TicketRecord {
                id: transaction_id.sub_ticket_id(kind, index),
                parent_id: Some(master.id.clone()),
                issued_at,
                status: TicketStatus::Valid,
                ..sub.clone()
            }
        })
        .collect();

    TicketBundle {
        master,
        sub_tickets,
    }
}

fn fallback_kind(sub: &TicketRecord) -> TicketKind {
    sub.single_item()
        .map(|item| TicketKind::for_rule(item.fan_out))
        .unwrap_or(TicketKind::Regular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::{fan_out, CheckoutContext};
    use crate::money::Money;
    use crate::types::{CartLine, FanOutRule, Issuer, PaymentMode};
    use chrono::Duration;

    fn original() -> TicketBundle {
        let lines = vec![
            CartLine {
                product_ref: "19".into(),
                display_name: "COMBO".into(),
                unit_price: Money::from_major(500),
                quantity: 1,
                fan_out: FanOutRule::Flat,
            },
            CartLine {
                product_ref: "4".into(),
                display_name: "TL TRAIN".into(),
                unit_price: Money::from_major(50),
                quantity: 2,
                fan_out: FanOutRule::PerUnit,
            },
        ];
        let now = Utc::now();
        fan_out(
            &lines,
            &CheckoutContext {
                transaction_id: TransactionId::generate(now),
                issued_at: now,
                phone: Some("9876543210".into()),
                payment_mode: PaymentMode::Upi,
                issuer: Issuer::named("Asha"),
            },
        )
        .unwrap()
    }

    fn fresh_reprint(b: &TicketBundle) -> TicketBundle {
        let at = Utc::now() + Duration::minutes(5);
        reprint(b, &TransactionId::generate(at), at)
    }

    #[test]
    fn test_reprint_twice_yields_distinct_identities() {
        let b = original();
        let b1 = fresh_reprint(&b);
        let b2 = fresh_reprint(&b);

        assert_ne!(b1.master.id, b.master.id);
        assert_ne!(b2.master.id, b.master.id);
        assert_ne!(b1.master.id, b2.master.id);

        for r in [&b1, &b2] {
            assert_eq!(r.master.items, b.master.items);
            assert_eq!(r.total(), b.total());
            assert_eq!(r.phone(), b.phone());
            assert_eq!(r.master.payment_mode, b.master.payment_mode);
        }
    }

    #[test]
    fn test_reprint_preserves_kind_and_index() {
        let b = original();
        let r = fresh_reprint(&b);

        assert_eq!(r.sub_tickets.len(), b.sub_tickets.len());
        for (old, new) in b.sub_tickets.iter().zip(&r.sub_tickets) {
            let o = SubTicketId::parse(&old.id).unwrap();
            let n = SubTicketId::parse(&new.id).unwrap();
            assert_eq!(n.parent, r.master.id);
            assert_eq!((n.kind, n.index), (o.kind, o.index));
            assert_eq!(new.parent_id.as_deref(), Some(r.master.id.as_str()));
            assert_eq!(new.issued_at, r.master.issued_at);
            assert_eq!(new.amount, old.amount);
            assert_eq!(new.items, old.items);
        }
    }

    #[test]
    fn test_reprint_resets_status() {
        let mut b = original();
        b.sub_tickets[0].status = TicketStatus::Used;
        let r = fresh_reprint(&b);
        assert!(r.records().all(|t| t.status == TicketStatus::Valid));
    }

    #[test]
    fn test_reprint_of_unparseable_ids_uses_position() {
        let mut b = original();
        for sub in &mut b.sub_tickets {
            sub.id = "legacy".into();
        }
        let r = fresh_reprint(&b);
        let first = SubTicketId::parse(&r.sub_tickets[0].id).unwrap();
        let last = SubTicketId::parse(&r.sub_tickets[7].id).unwrap();
        assert_eq!((first.kind, first.index), (TicketKind::Combo, 1));
        assert_eq!((last.kind, last.index), (TicketKind::Regular, 8));
    }
}
