//! Bundle rules and bundle view models

use crate::cart::CartLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discount code applied while at least one bundle is complete
pub const BUNDLE_DISCOUNT_CODE: &str = "BUNDLE20";

/// Name of the bundle type the storefront sells today
pub const MENS_TSHIRT_BUNDLE: &str = "Men's T-Shirt Bundle";

/// Required size when a bundle name has no explicit entry
pub const DEFAULT_BUNDLE_SIZE: u32 = 3;

fn default_size() -> u32 {
    DEFAULT_BUNDLE_SIZE
}

fn default_summary_option() -> String {
    "Color".to_string()
}

fn default_discount_code() -> String {
    BUNDLE_DISCOUNT_CODE.to_string()
}

/// Bundle completeness and display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRules {
    /// Required quantity per bundle name
    #[serde(default)]
    pub sizes: BTreeMap<String, u32>,
    #[serde(default = "default_size")]
    pub default_size: u32,
    /// Option counted in the composition summary
    #[serde(default = "default_summary_option")]
    pub summary_option: String,
    /// Code toggled by bundle completeness
    #[serde(default = "default_discount_code")]
    pub discount_code: String,
}

impl Default for BundleRules {
    fn default() -> Self {
        let mut sizes = BTreeMap::new();
        sizes.insert(MENS_TSHIRT_BUNDLE.to_string(), DEFAULT_BUNDLE_SIZE);
        Self {
            sizes,
            default_size: DEFAULT_BUNDLE_SIZE,
            summary_option: default_summary_option(),
            discount_code: default_discount_code(),
        }
    }
}

impl BundleRules {
    /// Required total quantity for a bundle name
    pub fn required_size(&self, bundle_name: Option<&str>) -> u32 {
        bundle_name
            .and_then(|name| {
                self.sizes.get(name).copied().or_else(|| {
                    self.sizes
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(name))
                        .map(|(_, v)| *v)
                })
            })
            .unwrap_or(self.default_size)
    }
}

/// Lines sharing one bundle identifier, with pricing and summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleGroup {
    pub bundle_id: String,
    pub bundle_name: String,
    pub lines: Vec<CartLine>,
    pub total_quantity: u32,
    pub required_size: u32,
    /// Sum of current line costs
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Sum of undiscounted unit price x quantity
    #[serde(with = "rust_decimal::serde::float")]
    pub original_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub savings: Decimal,
    /// e.g. "Black ×2, White"
    pub summary: String,
    pub complete: bool,
}

/// Cart lines partitioned for bundle display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleGrouping {
    pub groups: Vec<BundleGroup>,
    pub ungrouped: Vec<CartLine>,
}

impl BundleGrouping {
    pub fn any_complete(&self) -> bool {
        self.groups.iter().any(|g| g.complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_size_lookup() {
        let mut rules = BundleRules::default();
        rules.sizes.insert("Sock Trio".to_string(), 3);
        rules.sizes.insert("Cap Pair".to_string(), 2);

        assert_eq!(rules.required_size(Some(MENS_TSHIRT_BUNDLE)), 3);
        assert_eq!(rules.required_size(Some("cap pair")), 2);
        assert_eq!(rules.required_size(Some("Unknown")), DEFAULT_BUNDLE_SIZE);
        assert_eq!(rules.required_size(None), DEFAULT_BUNDLE_SIZE);
    }

    #[test]
    fn test_rules_deserialize_with_defaults() {
        let rules: BundleRules = serde_json::from_str(r#"{"sizes": {"Cap Pair": 2}}"#).unwrap();
        assert_eq!(rules.default_size, 3);
        assert_eq!(rules.summary_option, "Color");
        assert_eq!(rules.discount_code, BUNDLE_DISCOUNT_CODE);
        assert_eq!(rules.required_size(Some("Cap Pair")), 2);
    }
}
