//! Cart line

use super::attributes::LineAttributes;
use super::money::MoneyV2;
use serde::{Deserialize, Serialize};

/// Selected product option (e.g. Color = Black)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

impl SelectedOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Find an option value by name, case-insensitive
pub fn option_value<'a>(options: &'a [SelectedOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| o.name.eq_ignore_ascii_case(name))
        .map(|o| o.value.as_str())
}

/// Purchasable unit referenced by a line (product variant)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    /// Variant ID (e.g. "gid://shopify/ProductVariant/1")
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub product_handle: String,
    #[serde(default)]
    pub product_title: String,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[serde(default = "default_true")]
    pub available_for_sale: bool,
}

fn default_true() -> bool {
    true
}

/// Computed cost of a line, every field optional on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    /// Current line total (after line-level discounts)
    #[serde(default)]
    pub total_amount: Option<MoneyV2>,
    /// Current unit price
    #[serde(default)]
    pub amount_per_quantity: Option<MoneyV2>,
    /// Undiscounted unit price
    #[serde(default)]
    pub compare_at_amount_per_quantity: Option<MoneyV2>,
}

/// One merchandise entry in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Opaque line ID, stable for the line's lifetime
    pub id: String,
    pub merchandise: Merchandise,
    pub quantity: u32,
    #[serde(default)]
    pub cost: Option<LineCost>,
    #[serde(default)]
    pub attributes: LineAttributes,
}

impl CartLine {
    pub fn is_free(&self) -> bool {
        self.attributes.is_free()
    }

    /// Handle of the milestone that injected this line, for free lines only
    pub fn free_item_handle(&self) -> Option<&str> {
        if self.is_free() {
            self.attributes.free_item_type.as_deref()
        } else {
            None
        }
    }

    pub fn option_value(&self, name: &str) -> Option<&str> {
        option_value(&self.merchandise.selected_options, name)
    }

    /// Currency of the line cost, if any amount carries one
    pub fn currency_code(&self) -> Option<&str> {
        let cost = self.cost.as_ref()?;
        [
            &cost.total_amount,
            &cost.amount_per_quantity,
            &cost.compare_at_amount_per_quantity,
        ]
        .into_iter()
        .flatten()
        .map(|m| m.currency_code.as_str())
        .find(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_line() {
        let json = r#"{
            "id": "line-1",
            "merchandise": {"id": "variant-1"},
            "quantity": 2
        }"#;
        let line: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.quantity, 2);
        assert!(line.cost.is_none());
        assert!(line.merchandise.available_for_sale);
        assert!(!line.is_free());
    }

    #[test]
    fn test_deserialize_full_line() {
        let json = r#"{
            "id": "line-1",
            "merchandise": {
                "id": "variant-1",
                "title": "Black / M",
                "productHandle": "mens-tee",
                "productTitle": "Men's T-Shirt",
                "selectedOptions": [{"name": "Color", "value": "Black"}]
            },
            "quantity": 1,
            "cost": {
                "totalAmount": {"amount": "24.00", "currencyCode": "USD"},
                "compareAtAmountPerQuantity": {"amount": "30.00", "currencyCode": "USD"}
            },
            "attributes": [
                {"key": "_BUNDLE_NAME", "value": "Men's T-Shirt Bundle"},
                {"key": "_BUNDLE_ID", "value": "b-1"}
            ]
        }"#;
        let line: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.option_value("color"), Some("Black"));
        assert_eq!(line.attributes.bundle_key(), Some("b-1"));
        assert_eq!(line.currency_code(), Some("USD"));
    }
}
