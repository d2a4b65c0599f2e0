//! Cart snapshot returned by the cart store

use super::attributes::CartAttributes;
use super::line::CartLine;
use super::money::MoneyV2;
use serde::{Deserialize, Serialize};

/// Discount code applied to the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiscountCode {
    pub code: String,
    #[serde(default)]
    pub applicable: bool,
}

/// Cart-level cost summary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    #[serde(default)]
    pub subtotal_amount: Option<MoneyV2>,
    #[serde(default)]
    pub total_amount: Option<MoneyV2>,
}

/// Full cart state at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub id: String,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub attributes: CartAttributes,
    #[serde(default)]
    pub discount_codes: Vec<CartDiscountCode>,
    #[serde(default)]
    pub cost: Option<CartCost>,
    #[serde(default)]
    pub total_quantity: u32,
}

impl CartSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Whether `code` is applied, case-insensitive
    pub fn has_discount_code(&self, code: &str) -> bool {
        self.discount_codes
            .iter()
            .any(|d| d.code.eq_ignore_ascii_case(code))
    }

    pub fn discount_code_list(&self) -> Vec<String> {
        self.discount_codes.iter().map(|d| d.code.clone()).collect()
    }

    pub fn free_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| l.is_free())
    }

    /// Whether a free line for `handle` is present
    pub fn has_free_line_for(&self, handle: &str) -> bool {
        self.free_lines()
            .any(|l| l.free_item_handle() == Some(handle))
    }
}
