//! Reconciliation Planner
//!
//! Computes the minimal set of cart mutations that brings the cart in line
//! with the evaluated perks and bundle state. The plan is derived from the
//! snapshot alone, so a fresh and a stale snapshot of the same cart yield the
//! same decisions, and a cart already in its target state yields an empty plan.
//!
//! # Steps
//!
//! 1. Shipping flag upsert when desired and stored values differ
//! 2. Free line removal when the subtotal fell below the threshold stored on
//!    the line, plus duplicate free lines per handle and free lines with a
//!    quantity above one (re-added with quantity one by step 3)
//! 3. Free line addition for achieved milestones without a free line
//! 4. Bundle discount code toggle
//! 5. Declined handles whose milestone dropped are re-armed

use crate::resolver::FreeItemResolver;
use shared::cart::{CartAttributeUpdate, CartSnapshot};
use shared::models::{BUNDLE_DISCOUNT_CODE, MilestoneKind};
use shared::perks::CartPerksState;
use shared::plan::{FreeLineAdd, ReconciliationPlan};
use std::collections::{BTreeSet, HashSet};

/// Planner knobs that come from configuration
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    /// Code toggled by bundle completeness
    pub bundle_discount_code: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            bundle_discount_code: BUNDLE_DISCOUNT_CODE.to_string(),
        }
    }
}

/// Build the reconciliation plan for one cart
pub async fn plan(
    perks: &CartPerksState,
    bundle_complete: bool,
    cart: &CartSnapshot,
    resolver: &FreeItemResolver,
    settings: &PlannerSettings,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    if let Some(update) = plan_shipping(perks, cart) {
        plan.attribute_updates.push(update);
    }

    let (removals, retained) = plan_removals(perks, cart);
    plan.lines_to_remove = removals;

    plan.lines_to_add = plan_additions(perks, cart, &retained, resolver).await;

    let (add_codes, remove_codes) = plan_discount(bundle_complete, cart, settings);
    plan.discount_codes_to_add = add_codes;
    plan.discount_codes_to_remove = remove_codes;

    if let Some(update) = plan_declined(perks, cart) {
        plan.attribute_updates.push(update);
    }

    if !plan.is_empty() {
        tracing::debug!(
            cart_id = %cart.id,
            actions = plan.action_count(),
            remove = plan.lines_to_remove.len(),
            add = plan.lines_to_add.len(),
            "Reconciliation plan built"
        );
    }
    plan
}

/// Step 1: the shipping flag follows the shipping milestone, absent reads as false
pub fn plan_shipping(perks: &CartPerksState, cart: &CartSnapshot) -> Option<CartAttributeUpdate> {
    let update = CartAttributeUpdate::FreeShipping(perks.free_shipping_achieved());
    cart.attributes.differs(&update).then_some(update)
}

/// Step 2: free lines to remove, and the handles of the free lines that stay
///
/// Removal compares against the threshold stored on the line, not the
/// configured one, so a line outlives a configuration change until the cart
/// itself drops below what unlocked it. Lines without a stored threshold are
/// never auto-removed. A free line with quantity above one is removed and not
/// retained, so the addition step replaces it with a single unit. Of several
/// retained lines for one handle, only the first in cart order stays.
pub fn plan_removals(perks: &CartPerksState, cart: &CartSnapshot) -> (Vec<String>, HashSet<String>) {
    let mut removals = Vec::new();
    let mut retained = HashSet::new();

    for line in cart.free_lines() {
        let handle = line.free_item_handle();

        if let Some(threshold) = line.attributes.free_item_threshold
            && perks.subtotal < threshold
        {
            tracing::debug!(
                line_id = %line.id,
                handle = ?handle,
                %threshold,
                subtotal = %perks.subtotal,
                "Free line below its threshold"
            );
            removals.push(line.id.clone());
            continue;
        }

        if line.quantity > 1 {
            tracing::debug!(
                line_id = %line.id,
                handle = ?handle,
                quantity = line.quantity,
                "Free line above quantity one"
            );
            removals.push(line.id.clone());
            continue;
        }

        if let Some(handle) = handle
            && !retained.insert(handle.to_string())
        {
            tracing::debug!(line_id = %line.id, %handle, "Duplicate free line");
            removals.push(line.id.clone());
        }
    }

    (removals, retained)
}

/// Step 3: free lines to add for achieved milestones
pub async fn plan_additions(
    perks: &CartPerksState,
    cart: &CartSnapshot,
    retained: &HashSet<String>,
    resolver: &FreeItemResolver,
) -> Vec<FreeLineAdd> {
    let mut adds: Vec<FreeLineAdd> = Vec::new();

    for progress in perks.milestones.iter().filter(|p| p.achieved) {
        let MilestoneKind::FreeItem {
            handle,
            variant_selector,
            ..
        } = &progress.milestone.kind
        else {
            continue;
        };

        if retained.contains(handle) || adds.iter().any(|a| &a.handle == handle) {
            continue;
        }
        if cart.attributes.is_declined(handle) {
            tracing::debug!(cart_id = %cart.id, %handle, "Free item declined by shopper, not adding");
            continue;
        }

        let Some(resolved) = resolver.resolve(handle, variant_selector.as_deref()).await else {
            continue;
        };
        if !resolved.available_for_sale {
            tracing::warn!(%handle, variant_id = %resolved.variant_id, "Resolved free item unavailable");
            continue;
        }

        adds.push(FreeLineAdd::new(
            handle.clone(),
            progress.milestone.threshold,
            resolved.variant_id,
        ));
    }

    adds
}

/// Step 4: bundle discount code, other codes are never touched
pub fn plan_discount(
    bundle_complete: bool,
    cart: &CartSnapshot,
    settings: &PlannerSettings,
) -> (Vec<String>, Vec<String>) {
    let code = &settings.bundle_discount_code;
    let applied = cart.has_discount_code(code);

    match (bundle_complete, applied) {
        (true, false) => (vec![code.clone()], vec![]),
        (false, true) => (vec![], vec![code.clone()]),
        _ => (vec![], vec![]),
    }
}

/// Step 5: drop declined handles whose milestone is no longer achieved
pub fn plan_declined(perks: &CartPerksState, cart: &CartSnapshot) -> Option<CartAttributeUpdate> {
    let declined = &cart.attributes.declined_free_items;
    if declined.is_empty() {
        return None;
    }

    let still_achieved: BTreeSet<String> = declined
        .iter()
        .filter(|handle| perks.free_item(handle).is_some_and(|p| p.achieved))
        .cloned()
        .collect();

    if &still_achieved == declined {
        return None;
    }
    tracing::debug!(
        cart_id = %cart.id,
        rearmed = declined.len() - still_achieved.len(),
        "Re-arming declined free items"
    );
    Some(CartAttributeUpdate::DeclinedFreeItems(still_achieved))
}
