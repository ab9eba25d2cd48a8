//! # Print Layout
//!
//! Operator-adjustable margins and scale for the printable ticket region, and
//! the projection from a [`TicketBundle`] to the pages that get printed.
//!
//! ## Adjustment Domain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field          Unit      Domain          Reset                         │
//! │  ─────────────  ────────  ──────────────  ─────                         │
//! │  top_offset     px        ≥ 0             0                             │
//! │  bottom_offset  px        ≥ 0             0                             │
//! │  left_shift     px        any (negative   0                             │
//! │                           moves left)                                   │
//! │  scale          factor    [0.5, 1.5]      1                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pixels are CSS pixels at 96 dpi, as measured by the preview's drag
//! handles. The same `PrintSettings` value feeds the preview and the final
//! print; only the crop handles differ between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::loyalty;
use crate::money::Money;
use crate::types::{PaymentMode, TicketBundle, TicketRecord};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 1.5;

/// Height of one printed text line, in px.
pub const LINE_HEIGHT_PX: f64 = 16.0;

/// Width of one printed character, in px.
pub const CHAR_WIDTH_PX: f64 = 8.0;

/// Narrowest text column rendering will shrink to.
pub const MIN_TEXT_WIDTH: usize = 12;

/// Most blank lines a top or bottom offset adds to one page.
pub const MAX_OFFSET_LINES: usize = 64;

/// Header printed at the top of every ticket.
pub const TICKET_HEADER: &str = "RIDEPASS";

// =============================================================================
// Print Settings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    pub top_offset: f64,
    pub bottom_offset: f64,
    pub left_shift: f64,
    pub scale: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            top_offset: 0.0,
            bottom_offset: 0.0,
            left_shift: 0.0,
            scale: 1.0,
        }
    }
}

impl PrintSettings {
    pub fn adjust_top(&mut self, delta: f64) {
        self.top_offset = clamp_offset(self.top_offset + delta);
    }

    pub fn adjust_bottom(&mut self, delta: f64) {
        self.bottom_offset = clamp_offset(self.bottom_offset + delta);
    }

    pub fn adjust_shift(&mut self, delta: f64) {
        let shifted = self.left_shift + delta;
        if shifted.is_finite() {
            self.left_shift = shifted;
        }
    }

    pub fn adjust_scale(&mut self, delta: f64) {
        self.scale = clamp_scale(self.scale + delta);
    }

    /// Brings values read from storage back into their domain.
    pub fn clamped(self) -> Self {
        Self {
            top_offset: clamp_offset(self.top_offset),
            bottom_offset: clamp_offset(self.bottom_offset),
            left_shift: if self.left_shift.is_finite() {
                self.left_shift
            } else {
                0.0
            },
            scale: clamp_scale(self.scale),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn clamp_offset(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

// =============================================================================
// Render Projection
// =============================================================================

/// One printed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PageItem {
    pub name: String,
    pub quantity: i64,
    pub amount: Money,
}

/// One physical ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketPage {
    pub ticket_id: String,
    pub is_sub_ticket: bool,
    pub items: Vec<PageItem>,
    pub amount: Money,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub payment_mode: PaymentMode,
    pub issued_by: String,
    pub points_earned: Option<i64>,
}

/// What the printer (or the preview) draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TicketLayout {
    pub transaction_id: String,
    pub pages: Vec<TicketPage>,
    pub settings: PrintSettings,
    pub show_crop_handles: bool,
}

/// Projects `bundle` through `settings`.
///
/// Sub-tickets replace the master summary when present. `is_preview` only
/// toggles the crop handles.
pub fn render(bundle: &TicketBundle, settings: &PrintSettings, is_preview: bool) -> TicketLayout {
    let points_earned = loyalty::earned_points(bundle).filter(|p| *p > 0);

    let pages = if bundle.sub_tickets.is_empty() {
        vec![page(&bundle.master, points_earned)]
    } else {
        bundle
            .sub_tickets
            .iter()
            .map(|sub| page(sub, points_earned))
            .collect()
    };

    TicketLayout {
        transaction_id: bundle.master.id.clone(),
        pages,
        settings: *settings,
        show_crop_handles: is_preview,
    }
}

fn page(record: &TicketRecord, points_earned: Option<i64>) -> TicketPage {
    TicketPage {
        ticket_id: record.id.clone(),
        is_sub_ticket: record.is_sub_ticket,
        items: record
            .items
            .iter()
            .map(|line| PageItem {
                name: line.display_name.clone(),
                quantity: line.quantity,
                amount: line.line_total(),
            })
            .collect(),
        amount: record.amount,
        issued_at: record.issued_at,
        payment_mode: record.payment_mode,
        issued_by: record.issued_by.clone(),
        points_earned,
    }
}

impl TicketLayout {
    /// Text columns available after scaling `paper_width_chars`.
    pub fn text_width(&self, paper_width_chars: usize) -> usize {
        ((paper_width_chars as f64 / self.settings.scale).floor() as usize).max(MIN_TEXT_WIDTH)
    }

    /// Renders every page as monospaced text for a line printer.
    ///
    /// Offsets become blank lines (top, bottom) and leading spaces (left
    /// shift). A negative shift cannot move text past the paper edge and is
    /// printed flush left. The indent never exceeds the paper width and each
    /// offset adds at most [`MAX_OFFSET_LINES`] lines.
    pub fn to_text(&self, paper_width_chars: usize) -> String {
        let width = self.text_width(paper_width_chars);
        let top = px_to_units(self.settings.top_offset, LINE_HEIGHT_PX).min(MAX_OFFSET_LINES);
        let bottom = px_to_units(self.settings.bottom_offset, LINE_HEIGHT_PX).min(MAX_OFFSET_LINES);
        let shift = px_to_units(self.settings.left_shift, CHAR_WIDTH_PX).min(paper_width_chars);
        let indent = " ".repeat(shift);

        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push_str(&"-".repeat(width));
                out.push('\n');
            }
            for _ in 0..top {
                out.push('\n');
            }
            if self.show_crop_handles {
                out.push_str(&indent);
                out.push_str(&crop_line(width));
                out.push('\n');
            }
            for line in page_lines(page) {
                for chunk in wrap(&line, width) {
                    out.push_str(&indent);
                    out.push_str(&chunk);
                    out.push('\n');
                }
            }
            if self.show_crop_handles {
                out.push_str(&indent);
                out.push_str(&crop_line(width));
                out.push('\n');
            }
            for _ in 0..bottom {
                out.push('\n');
            }
        }
        out
    }
}

fn page_lines(page: &TicketPage) -> Vec<String> {
    let mut lines = vec![
        TICKET_HEADER.to_string(),
        if page.is_sub_ticket {
            "ADMIT ONE".to_string()
        } else {
            "RECEIPT".to_string()
        },
        page.ticket_id.clone(),
    ];
    for item in &page.items {
        lines.push(format!("{} x{} {}", item.name, item.quantity, item.amount));
    }
    lines.push(format!("AMOUNT {}", page.amount));
    lines.push(page.issued_at.format("%Y-%m-%d %H:%M").to_string());
    lines.push(format!(
        "{} / {}",
        page.payment_mode.as_str().to_uppercase(),
        page.issued_by
    ));
    if let Some(points) = page.points_earned {
        lines.push(format!("+{points} LOYALTY POINTS"));
    }
    lines
}

/// Saturates at `usize::MAX` for huge values; callers cap the result.
fn px_to_units(px: f64, unit: f64) -> usize {
    if px.is_finite() && px > 0.0 {
        (px / unit).round() as usize
    } else {
        0
    }
}

fn crop_line(width: usize) -> String {
    format!("+{}+", "-".repeat(width.saturating_sub(2)))
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::{fan_out, CheckoutContext};
    use crate::types::{CartLine, FanOutRule, Issuer, TransactionId};

    fn bundle(lines: Vec<CartLine>, phone: Option<&str>) -> TicketBundle {
        let now = Utc::now();
        fan_out(
            &lines,
            &CheckoutContext {
                transaction_id: TransactionId::generate(now),
                issued_at: now,
                phone: phone.map(String::from),
                payment_mode: PaymentMode::Cash,
                issuer: Issuer::named("Asha"),
            },
        )
        .unwrap()
    }

    fn train(qty: i64) -> CartLine {
        CartLine {
            product_ref: "4".into(),
            display_name: "TL TRAIN".into(),
            unit_price: Money::from_major(50),
            quantity: qty,
            fan_out: FanOutRule::PerUnit,
        }
    }

    #[test]
    fn test_offsets_clamp_at_zero() {
        let mut s = PrintSettings::default();
        s.adjust_top(-10.0);
        s.adjust_bottom(12.0);
        s.adjust_bottom(-20.0);
        assert_eq!(s.top_offset, 0.0);
        assert_eq!(s.bottom_offset, 0.0);
    }

    #[test]
    fn test_shift_may_go_negative() {
        let mut s = PrintSettings::default();
        s.adjust_shift(-24.0);
        assert_eq!(s.left_shift, -24.0);
    }

    #[test]
    fn test_scale_clamped() {
        let mut s = PrintSettings::default();
        s.adjust_scale(2.0);
        assert_eq!(s.scale, MAX_SCALE);
        s.adjust_scale(-5.0);
        assert_eq!(s.scale, MIN_SCALE);
        s.adjust_scale(0.25);
        assert_eq!(s.scale, 0.75);
    }

    #[test]
    fn test_clamped_repairs_stored_values() {
        let stored = PrintSettings {
            top_offset: -3.0,
            bottom_offset: f64::NAN,
            left_shift: -8.0,
            scale: 9.0,
        };
        let fixed = stored.clamped();
        assert_eq!(fixed.top_offset, 0.0);
        assert_eq!(fixed.bottom_offset, 0.0);
        assert_eq!(fixed.left_shift, -8.0);
        assert_eq!(fixed.scale, MAX_SCALE);
    }

    #[test]
    fn test_settings_wire_names() {
        let json = serde_json::to_value(PrintSettings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"topOffset": 0.0, "bottomOffset": 0.0, "leftShift": 0.0, "scale": 1.0})
        );
    }

    #[test]
    fn test_render_skips_master_when_sub_tickets_exist() {
        let b = bundle(vec![train(2)], None);
        let layout = render(&b, &PrintSettings::default(), false);

        assert_eq!(layout.pages.len(), 2);
        assert!(layout.pages.iter().all(|p| p.is_sub_ticket));
        assert_eq!(layout.pages[0].ticket_id, b.sub_tickets[0].id);
    }

    #[test]
    fn test_render_master_without_sub_tickets() {
        let mut b = bundle(vec![train(1)], None);
        b.sub_tickets.clear();
        let layout = render(&b, &PrintSettings::default(), false);

        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.pages[0].ticket_id, b.master.id);
    }

    #[test]
    fn test_points_shown_only_with_phone() {
        let with_phone = render(&bundle(vec![train(4)], Some("9876543210")), &PrintSettings::default(), false);
        assert!(with_phone.pages.iter().all(|p| p.points_earned == Some(20)));

        let without = render(&bundle(vec![train(4)], None), &PrintSettings::default(), false);
        assert!(without.pages.iter().all(|p| p.points_earned.is_none()));
    }

    #[test]
    fn test_preview_flag_changes_only_crop_handles() {
        let b = bundle(vec![train(2)], None);
        let settings = PrintSettings {
            top_offset: 32.0,
            ..PrintSettings::default()
        };
        let preview = render(&b, &settings, true);
        let print = render(&b, &settings, false);

        assert!(preview.show_crop_handles);
        assert!(!print.show_crop_handles);
        assert_eq!(preview.pages, print.pages);
        assert_eq!(preview.settings, print.settings);
    }

    #[test]
    fn test_text_applies_offsets() {
        let b = bundle(vec![train(1)], None);
        let settings = PrintSettings {
            top_offset: 32.0,
            bottom_offset: 16.0,
            left_shift: 16.0,
            scale: 1.0,
        };
        let text = render(&b, &settings, false).to_text(32);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "  RIDEPASS");
        assert_eq!(lines[3], "  ADMIT ONE");
        assert_eq!(*lines.last().unwrap(), "");
        assert!(text.contains("TL TRAIN x1 ₹50.00"));
    }

    #[test]
    fn test_text_width_follows_scale() {
        let b = bundle(vec![train(1)], None);
        let mut settings = PrintSettings::default();
        settings.adjust_scale(0.5);
        let layout = render(&b, &settings, false);

        assert_eq!(layout.text_width(30), 20);
        for line in layout.to_text(30).lines() {
            assert!(line.chars().count() <= 20);
        }
    }

    #[test]
    fn test_huge_offsets_are_capped() {
        let b = bundle(vec![train(1)], None);
        let mut settings = PrintSettings::default();
        settings.adjust_shift(1e300);
        settings.adjust_top(1e300);
        settings.adjust_bottom(1e300);
        let text = render(&b, &settings, false).to_text(32);
        let lines: Vec<&str> = text.lines().collect();

        let indented = lines.iter().find(|l| l.ends_with("RIDEPASS")).unwrap();
        assert_eq!(indented.len(), 32 + "RIDEPASS".len());
        assert!(lines.len() <= 2 * MAX_OFFSET_LINES + 20);
    }
}
