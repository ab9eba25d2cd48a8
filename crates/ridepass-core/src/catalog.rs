//! # Catalog
//!
//! The set of rides the register can sell, with each product's fan-out rule
//! resolved exactly once at load time.
//!
//! ```text
//! products endpoint ──► Catalog::load(products, &ComboPolicy)
//!                              │
//!                              ├── inactive? ──► dropped
//!                              │
//!                              └── classify ──► CatalogItem { product, fan_out }
//!                                                     │
//!                                                     ▼
//!                                          Cart::add_product copies fan_out
//!                                          into the CartLine
//! ```

use std::collections::BTreeSet;

use crate::types::{FanOutRule, Product};

/// Product ids sold as combo passes regardless of their name.
pub const DEFAULT_COMBO_PRODUCT_IDS: [&str; 3] = ["19", "20", "21"];

/// Case-insensitive name marker identifying a combo pass.
pub const DEFAULT_COMBO_NAME_MARKER: &str = "combo";

// =============================================================================
// Combo Policy
// =============================================================================

/// Static policy deciding which products are combo passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboPolicy {
    pub allow_list: BTreeSet<String>,
    pub name_marker: String,
}

impl Default for ComboPolicy {
    fn default() -> Self {
        Self {
            allow_list: DEFAULT_COMBO_PRODUCT_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            name_marker: DEFAULT_COMBO_NAME_MARKER.to_string(),
        }
    }
}

impl ComboPolicy {
    /// `Flat` when the id is allow-listed or the name contains the marker.
    pub fn classify(&self, product: &Product) -> FanOutRule {
        let marker = self.name_marker.to_lowercase();
        let by_name = !marker.is_empty() && product.name.to_lowercase().contains(&marker);

        if by_name || self.allow_list.contains(&product.id) {
            FanOutRule::Flat
        } else {
            FanOutRule::PerUnit
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A sellable product together with its resolved fan-out rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub product: Product,
    pub fan_out: FanOutRule,
}

/// Active products in the order the catalog collaborator returned them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn load(products: Vec<Product>, policy: &ComboPolicy) -> Self {
        let items = products
            .into_iter()
            .filter(|p| p.active)
            .map(|product| CatalogItem {
                fan_out: policy.classify(&product),
                product,
            })
            .collect();

        Self { items }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.product.id == id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_classify_by_name_marker() {
        let policy = ComboPolicy::default();
        let combo = Product::new("7", "Family Combo (5 Rides)", Money::from_major(500));
        let train = Product::new("4", "TL TRAIN", Money::from_major(50));

        assert_eq!(policy.classify(&combo), FanOutRule::Flat);
        assert_eq!(policy.classify(&train), FanOutRule::PerUnit);
    }

    #[test]
    fn test_classify_by_allow_list() {
        let policy = ComboPolicy::default();
        let pass = Product::new("20", "DAY PASS", Money::from_major(600));
        assert_eq!(policy.classify(&pass), FanOutRule::Flat);
    }

    #[test]
    fn test_load_excludes_inactive_products() {
        let mut retired = Product::new("9", "OLD COASTER", Money::from_major(80));
        retired.active = false;

        let catalog = Catalog::load(
            vec![
                Product::new("19", "COMBO", Money::from_major(500)),
                retired,
                Product::new("4", "TL TRAIN", Money::from_major(50)),
            ],
            &ComboPolicy::default(),
        );

        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("9").is_none());
        assert_eq!(catalog.get("19").unwrap().fan_out, FanOutRule::Flat);
        assert_eq!(catalog.get("4").unwrap().fan_out, FanOutRule::PerUnit);
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        let policy = ComboPolicy {
            allow_list: BTreeSet::new(),
            name_marker: String::new(),
        };
        let p = Product::new("1", "COMBO", Money::from_major(500));
        assert_eq!(policy.classify(&p), FanOutRule::PerUnit);
    }
}
