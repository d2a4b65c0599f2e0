//! Perks view models
//!
//! Derived per reconciliation pass and handed to the UI layer for progress bar
//! rendering. Never stored.

use crate::models::Milestone;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Milestone plus its evaluation against the current subtotal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    #[serde(flatten)]
    pub milestone: Milestone,
    /// subtotal >= threshold
    pub achieved: bool,
    /// Same as `achieved` today; reserved for stock-gated eligibility
    pub eligible: bool,
    /// max(0, threshold - subtotal)
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    /// 0..=100, for progress bars
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percent: Decimal,
}

/// Perk state of one cart under one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPerksState {
    pub variant_id: String,
    /// Reconciliation subtotal (free lines excluded)
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub milestones: Vec<MilestoneProgress>,
    /// First unachieved milestone in variant order
    pub next: Option<MilestoneProgress>,
    pub has_progress: bool,
    pub all_achieved: bool,
}

impl CartPerksState {
    /// Achievement of the shipping milestone, false when none is configured
    pub fn free_shipping_achieved(&self) -> bool {
        self.milestones
            .iter()
            .find(|p| p.milestone.is_shipping())
            .is_some_and(|p| p.achieved)
    }

    /// Progress entry for a free-item handle
    pub fn free_item(&self, handle: &str) -> Option<&MilestoneProgress> {
        self.milestones
            .iter()
            .find(|p| p.milestone.free_item_handle() == Some(handle))
    }
}
