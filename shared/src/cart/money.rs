//! Money as delivered by storefront APIs (decimal string + ISO currency code)

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Monetary amount on the wire
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    /// Decimal amount as a string, e.g. "49.99"
    #[serde(default)]
    pub amount: String,
    /// ISO 4217 currency code, e.g. "USD"
    #[serde(default)]
    pub currency_code: String,
}

impl MoneyV2 {
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.normalize().to_string(),
            currency_code: currency_code.into(),
        }
    }

    /// Parse the amount, `None` when missing or malformed
    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = self.amount.trim();
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }

    /// Parsed amount, malformed values count as zero
    pub fn amount_or_zero(&self) -> Decimal {
        self.to_decimal().unwrap_or(Decimal::ZERO)
    }
}
