//! Reconciliation plan
//!
//! Pure data describing the cart mutations needed to reach a consistent state.
//! An empty plan is the steady state.

use crate::cart::{CartAttributeUpdate, CartLineInput, LineAttributes};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Free line to inject for an achieved milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeLineAdd {
    /// Milestone product handle
    pub handle: String,
    /// Threshold stamped onto the line
    #[serde(with = "rust_decimal::serde::float")]
    pub threshold: Decimal,
    /// Resolved variant ID
    pub merchandise_id: String,
    pub quantity: u32,
    pub attributes: LineAttributes,
}

impl FreeLineAdd {
    pub fn new(handle: impl Into<String>, threshold: Decimal, merchandise_id: impl Into<String>) -> Self {
        let handle = handle.into();
        Self {
            attributes: LineAttributes::free_item(handle.clone(), threshold),
            handle,
            threshold,
            merchandise_id: merchandise_id.into(),
            quantity: 1,
        }
    }

    pub fn to_line_input(&self) -> CartLineInput {
        CartLineInput {
            merchandise_id: self.merchandise_id.clone(),
            quantity: self.quantity,
            attributes: self.attributes.clone(),
        }
    }
}

/// Declarative diff the engine wants applied to the cart
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    pub attribute_updates: Vec<CartAttributeUpdate>,
    pub lines_to_add: Vec<FreeLineAdd>,
    pub lines_to_remove: Vec<String>,
    pub discount_codes_to_add: Vec<String>,
    pub discount_codes_to_remove: Vec<String>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.attribute_updates.is_empty()
            && self.lines_to_add.is_empty()
            && self.lines_to_remove.is_empty()
            && self.discount_codes_to_add.is_empty()
            && self.discount_codes_to_remove.is_empty()
    }

    /// Number of individual actions in the plan
    pub fn action_count(&self) -> usize {
        self.attribute_updates.len()
            + self.lines_to_add.len()
            + self.lines_to_remove.len()
            + self.discount_codes_to_add.len()
            + self.discount_codes_to_remove.len()
    }
}
