//! Milestone and Variant models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Effect of an achieved milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MilestoneKind {
    /// Free shipping flag on the cart
    Shipping,
    /// Engine-injected free line
    #[serde(rename_all = "camelCase")]
    FreeItem {
        /// Product handle in the catalog
        handle: String,
        /// Display title (e.g. "Black Sunnies")
        title: String,
        /// Option value to pick a specific variant (e.g. a color)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant_selector: Option<String>,
    },
}

/// Single threshold rule: spend >= threshold triggers the effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Inclusive subtotal threshold in currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub threshold: Decimal,
    #[serde(flatten)]
    pub kind: MilestoneKind,
    /// Progress bar label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Milestone {
    pub fn shipping(threshold: Decimal) -> Self {
        Self {
            threshold,
            kind: MilestoneKind::Shipping,
            label: None,
        }
    }

    pub fn free_item(
        threshold: Decimal,
        handle: impl Into<String>,
        title: impl Into<String>,
        variant_selector: Option<&str>,
    ) -> Self {
        Self {
            threshold,
            kind: MilestoneKind::FreeItem {
                handle: handle.into(),
                title: title.into(),
                variant_selector: variant_selector.map(str::to_string),
            },
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_shipping(&self) -> bool {
        matches!(self.kind, MilestoneKind::Shipping)
    }

    pub fn free_item_handle(&self) -> Option<&str> {
        match &self.kind {
            MilestoneKind::FreeItem { handle, .. } => Some(handle),
            MilestoneKind::Shipping => None,
        }
    }

    /// Label for display, derived from the kind when not configured
    pub fn display_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.kind {
            MilestoneKind::Shipping => "Free Shipping".to_string(),
            MilestoneKind::FreeItem { title, .. } => format!("Free {}", title),
        }
    }
}

/// Named ordered set of milestones, selected by experiment assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub milestones: Vec<Milestone>,
}

impl Variant {
    pub fn new(id: impl Into<String>, milestones: Vec<Milestone>) -> Self {
        Self {
            id: id.into(),
            name: None,
            milestones,
        }
    }

    /// First shipping milestone, if any is configured
    pub fn shipping_milestone(&self) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.is_shipping())
    }

    pub fn free_item_milestones(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.iter().filter(|m| !m.is_shipping())
    }
}
