//! # Cart
//!
//! The register's working cart. Owned by the active register session and
//! discarded on confirm or explicit clear.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_product(item, qty)   existing line? quantity += qty : new line    │
//! │  change_quantity(ref, δ)  quantity += δ, removed when it reaches 0     │
//! │  remove(ref)              drop the line                                │
//! │  add_reward()             "Free Priority Ride" line, at most once      │
//! │  clear()                  empty the cart                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Limits: [`MAX_CART_ITEMS`] distinct lines, [`MAX_ITEM_QUANTITY`] per line.

use crate::catalog::CatalogItem;
use crate::error::{CoreError, CoreResult};
use crate::loyalty;
use crate::money::Money;
use crate::types::CartLine;
use crate::validation::{validate_cart_size, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn line(&self, product_ref: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_ref == product_ref)
    }

    /// Adds `qty` units of a catalog product.
    pub fn add_product(&mut self, item: &CatalogItem, qty: i64) -> CoreResult<()> {
        validate_quantity(qty)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_ref == item.product.id)
        {
            let requested = line.quantity + qty;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = requested;
            return Ok(());
        }

        self.push(CartLine {
            product_ref: item.product.id.clone(),
            display_name: item.product.name.clone(),
            unit_price: item.product.price,
            quantity: qty,
            fan_out: item.fan_out,
        })
    }

    /// Adjusts a line's quantity by `delta`; the line is removed at zero.
    pub fn change_quantity(&mut self, product_ref: &str, delta: i64) -> CoreResult<()> {
        let idx = self.position(product_ref)?;
        let requested = self.lines[idx].quantity + delta;

        if requested <= 0 {
            self.lines.remove(idx);
        } else if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        } else {
            self.lines[idx].quantity = requested;
        }
        Ok(())
    }

    pub fn remove(&mut self, product_ref: &str) -> CoreResult<CartLine> {
        let idx = self.position(product_ref)?;
        Ok(self.lines.remove(idx))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Adds the loyalty reward line. Returns `false` if it is already there.
    pub fn add_reward(&mut self) -> CoreResult<bool> {
        if self.line(loyalty::REWARD_PRODUCT_REF).is_some() {
            return Ok(false);
        }
        self.push(loyalty::reward_line())?;
        Ok(true)
    }

    /// Units of the reward line, each redeemed separately.
    pub fn reward_units(&self) -> i64 {
        loyalty::reward_units(&self.lines)
    }

    fn push(&mut self, line: CartLine) -> CoreResult<()> {
        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;
        self.lines.push(line);
        Ok(())
    }

    fn position(&self, product_ref: &str) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.product_ref == product_ref)
            .ok_or_else(|| CoreError::ProductNotInCart(product_ref.to_string()))
    }
}
