//! # Domain Types
//!
//! Core domain types used throughout RidePass.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │  TicketRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (catalog)   │──►│  product_ref    │──►│  id             │       │
//! │  │  name           │   │  display_name   │   │  amount         │       │
//! │  │  price          │   │  unit_price     │   │  items          │       │
//! │  │  active         │   │  quantity       │   │  parent_id      │       │
//! │  └─────────────────┘   │  fan_out        │   │  status         │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │                        ┌──────────────────────────────▼──────────┐     │
//! │                        │ TicketBundle = master + Vec<sub-ticket> │     │
//! │                        └─────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Master id: `TXN-{yymmddHHMMSSmmm}-{8 hex}`, time-ordered and unique
//! - Sub-ticket id: `{master id}-{C|R}{n}`, `n` counting across the bundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A ride or attraction offered at the register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog identifier (the product reference carried by cart lines).
    pub id: String,

    /// Display name shown to the cashier and printed on the ticket.
    pub name: String,

    /// Price per admission.
    pub price: Money,

    /// Optional grouping for the ride grid.
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Inactive products are hidden from the register.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Creates an active product with no category or description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: None,
            description: None,
            active: true,
        }
    }
}

// =============================================================================
// Fan-Out Rule
// =============================================================================

/// How a cart line becomes physical tickets.
///
/// Resolved once when the catalog is loaded, then carried by every cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum FanOutRule {
    /// One ticket per unit, priced at the line's unit price.
    PerUnit,
    /// Combo pass: a fixed number of tickets per unit at a flat rate.
    Flat,
}

impl Default for FanOutRule {
    fn default() -> Self {
        FanOutRule::PerUnit
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the register cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_ref: String,
    pub display_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub fan_out: FanOutRule,
}

impl CartLine {
    /// unit_price × quantity
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn is_combo(&self) -> bool {
        self.fan_out == FanOutRule::Flat
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

/// Operator-selected payment mode. Never verified by the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }

    /// Parses an operator-entered mode, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Some(PaymentMode::Cash),
            "upi" => Some(PaymentMode::Upi),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Ticket Status
// =============================================================================

/// Redemption status of a ticket.
///
/// The register always issues `Valid`; the gate scanner moves tickets to
/// `Used` or `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Valid,
    Used,
    Invalid,
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Valid
    }
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Valid => "valid",
            TicketStatus::Used => "used",
            TicketStatus::Invalid => "invalid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "valid" => Some(TicketStatus::Valid),
            "used" => Some(TicketStatus::Used),
            "invalid" => Some(TicketStatus::Invalid),
            _ => None,
        }
    }
}

// =============================================================================
// Ticket Kind
// =============================================================================

/// Tag embedded in a sub-ticket id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TicketKind {
    /// `C`: one admission of a combo pass.
    Combo,
    /// `R`: one admission of a regular ride.
    Regular,
}

impl TicketKind {
    pub const fn tag(&self) -> char {
        match self {
            TicketKind::Combo => 'C',
            TicketKind::Regular => 'R',
        }
    }

    pub const fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'C' => Some(TicketKind::Combo),
            'R' => Some(TicketKind::Regular),
            _ => None,
        }
    }

    pub const fn for_rule(rule: FanOutRule) -> Self {
        match rule {
            FanOutRule::Flat => TicketKind::Combo,
            FanOutRule::PerUnit => TicketKind::Regular,
        }
    }
}

// =============================================================================
// Issuer
// =============================================================================

/// The signed-in operator, as read from the established session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Issuer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Issuer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Name printed on the ticket: name, else email, else "Cashier".
    pub fn display_name(&self) -> String {
        [&self.name, &self.email]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("Cashier")
            .to_string()
    }
}

// =============================================================================
// Transaction Id
// =============================================================================

/// Identity of one checkout (the master record id).
///
/// The timestamp part makes ids sort by issue time; the random suffix keeps
/// two checkouts in the same millisecond apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Mints a fresh id for a checkout issued at `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        TransactionId(format!(
            "TXN-{}-{}",
            now.format("%y%m%d%H%M%S%3f"),
            suffix[..8].to_uppercase()
        ))
    }

    /// Wraps an id that was issued earlier (e.g. read back from storage).
    pub fn from_existing(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the `index`-th sub-ticket of this transaction.
    pub fn sub_ticket_id(&self, kind: TicketKind, index: u32) -> String {
        SubTicketId {
            parent: self.0.clone(),
            kind,
            index,
        }
        .to_string()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed form of `{parent}-{C|R}{index}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTicketId {
    pub parent: String,
    pub kind: TicketKind,
    pub index: u32,
}

impl SubTicketId {
    pub fn parse(id: &str) -> Option<Self> {
        let (parent, tail) = id.rsplit_once('-')?;
        let mut chars = tail.chars();
        let kind = TicketKind::from_tag(chars.next()?)?;
        let digits = chars.as_str();
        if parent.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse().ok()?;
        Some(Self {
            parent: parent.to_string(),
            kind,
            index,
        })
    }
}

impl fmt::Display for SubTicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.parent, self.kind.tag(), self.index)
    }
}

// =============================================================================
// Ticket Record
// =============================================================================

/// A master record or a sub-ticket.
///
/// Both share one shape so a whole bundle can be submitted, queued and
/// journaled as a flat list. A sub-ticket carries exactly one item of
/// quantity 1 and the master's id as `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub id: String,
    pub amount: Money,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub phone: Option<String>,
    pub payment_mode: PaymentMode,
    pub issued_by: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub is_sub_ticket: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl TicketRecord {
    /// Kind tag of a sub-ticket, `None` for a master record.
    pub fn kind(&self) -> Option<TicketKind> {
        if !self.is_sub_ticket {
            return None;
        }
        SubTicketId::parse(&self.id).map(|sub| sub.kind)
    }

    /// The single line item printed on a sub-ticket.
    pub fn single_item(&self) -> Option<&CartLine> {
        match self.items.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

// =============================================================================
// Ticket Bundle
// =============================================================================

/// Everything one checkout prints: the master summary plus sub-tickets in
/// physical print order.
///
/// Sub-ticket amounts need not add up to the master amount: combo passes
/// print flat-rate admissions whatever the pass itself cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketBundle {
    pub master: TicketRecord,
    pub sub_tickets: Vec<TicketRecord>,
}

impl TicketBundle {
    pub fn transaction_id(&self) -> &str {
        &self.master.id
    }

    pub fn total(&self) -> Money {
        self.master.amount
    }

    pub fn phone(&self) -> Option<&str> {
        self.master.phone.as_deref()
    }

    /// Master first, then sub-tickets in print order.
    pub fn records(&self) -> impl Iterator<Item = &TicketRecord> {
        std::iter::once(&self.master).chain(self.sub_tickets.iter())
    }

    /// Flattens the bundle into the batch sent to ticket persistence.
    pub fn to_records(&self) -> Vec<TicketRecord> {
        self.records().cloned().collect()
    }

    /// Number of records in the persistence batch.
    pub fn record_count(&self) -> usize {
        1 + self.sub_tickets.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let id = TransactionId::generate(now);
        let s = id.as_str();

        assert!(s.starts_with("TXN-260314092653000-"));
        let suffix = s.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_transaction_ids_unique_within_same_instant() {
        let now = Utc::now();
        let a = TransactionId::generate(now);
        let b = TransactionId::generate(now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_ids_sort_by_time() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        assert!(TransactionId::generate(earlier) < TransactionId::generate(later));
    }

    #[test]
    fn test_sub_ticket_id_round_trip() {
        let txn = TransactionId::from_existing("TXN-260314092653000-ABCD1234");
        let id = txn.sub_ticket_id(TicketKind::Combo, 12);
        assert_eq!(id, "TXN-260314092653000-ABCD1234-C12");

        let parsed = SubTicketId::parse(&id).unwrap();
        assert_eq!(parsed.parent, txn.as_str());
        assert_eq!(parsed.kind, TicketKind::Combo);
        assert_eq!(parsed.index, 12);
    }

    #[test]
    fn test_sub_ticket_id_rejects_master_ids() {
        assert!(SubTicketId::parse("TXN-260314092653000-ABCD1234").is_none());
        assert!(SubTicketId::parse("TXN-1-R").is_none());
        assert!(SubTicketId::parse("-R1").is_none());
    }

    #[test]
    fn test_issuer_display_name_fallbacks() {
        assert_eq!(Issuer::named("Asha").display_name(), "Asha");

        let by_email = Issuer {
            name: Some("  ".into()),
            email: Some("desk@venue.in".into()),
            role: None,
        };
        assert_eq!(by_email.display_name(), "desk@venue.in");

        assert_eq!(Issuer::default().display_name(), "Cashier");
    }

    #[test]
    fn test_payment_mode_parse_and_wire_name() {
        assert_eq!(PaymentMode::parse("UPI"), Some(PaymentMode::Upi));
        assert_eq!(PaymentMode::parse("card"), None);
        assert_eq!(serde_json::to_string(&PaymentMode::Cash).unwrap(), "\"cash\"");
    }

    #[test]
    fn test_ticket_status_defaults_to_valid() {
        assert_eq!(TicketStatus::default(), TicketStatus::Valid);
        assert_eq!(TicketStatus::parse("used"), Some(TicketStatus::Used));
        assert_eq!(TicketStatus::parse("void"), None);
    }
}
