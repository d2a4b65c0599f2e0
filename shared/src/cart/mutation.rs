//! Cart mutation inputs and results

use super::attributes::LineAttributes;
use super::snapshot::CartSnapshot;
use serde::{Deserialize, Serialize};

/// New line to add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub attributes: LineAttributes,
}

/// Update to an existing line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<LineAttributes>,
}

/// Non-fatal warning returned with a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartWarning {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

/// Error the cart store attached to a mutation it could not fully apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Result of any cart mutation: the resulting cart plus diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    pub cart: CartSnapshot,
    #[serde(default)]
    pub warnings: Vec<CartWarning>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

impl CartMutation {
    pub fn ok(cart: CartSnapshot) -> Self {
        Self {
            cart,
            warnings: vec![],
            user_errors: vec![],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.user_errors.is_empty()
    }
}
