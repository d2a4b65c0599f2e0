//! Milestone Evaluator
//!
//! Pure function from (subtotal, variant) to the perks view model. Thresholds
//! are inclusive: a subtotal exactly at the threshold achieves it.

use crate::money::{progress_percent, shortfall};
use rust_decimal::Decimal;
use shared::models::{Milestone, Variant};
use shared::perks::{CartPerksState, MilestoneProgress};

/// Evaluate one milestone against a subtotal
pub fn evaluate_milestone(subtotal: Decimal, milestone: &Milestone) -> MilestoneProgress {
    let achieved = subtotal >= milestone.threshold;
    MilestoneProgress {
        milestone: milestone.clone(),
        achieved,
        eligible: achieved,
        remaining: shortfall(milestone.threshold, subtotal),
        progress_percent: progress_percent(subtotal, milestone.threshold),
    }
}

/// Evaluate every milestone of a variant, preserving variant order
pub fn evaluate(subtotal: Decimal, variant: &Variant) -> CartPerksState {
    let milestones: Vec<MilestoneProgress> = variant
        .milestones
        .iter()
        .map(|m| evaluate_milestone(subtotal, m))
        .collect();

    let next = milestones.iter().find(|p| !p.achieved).cloned();
    let all_achieved = !milestones.is_empty() && next.is_none();
    let has_progress = subtotal > Decimal::ZERO && next.is_some();

    CartPerksState {
        variant_id: variant.id.clone(),
        subtotal,
        milestones,
        next,
        has_progress,
        all_achieved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestones::variants::{VARIANT_A, VARIANT_B, VariantCatalog};
    use proptest::prelude::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let m = Milestone::shipping(dec(50));
        let at = evaluate_milestone(dec(50), &m);
        assert!(at.achieved);
        assert!(at.eligible);
        assert_eq!(at.remaining, Decimal::ZERO);

        let below = evaluate_milestone(Decimal::new(4999, 2), &m);
        assert!(!below.achieved);
        assert_eq!(below.remaining, Decimal::new(1, 2));
    }

    #[test]
    fn test_remaining_is_clamped() {
        let m = Milestone::shipping(dec(50));
        assert_eq!(evaluate_milestone(dec(80), &m).remaining, Decimal::ZERO);
    }

    #[test]
    fn test_variant_b_partial_progress() {
        let catalog = VariantCatalog::builtin();
        let state = evaluate(dec(120), catalog.resolve(Some(VARIANT_B)));

        assert_eq!(state.variant_id, VARIANT_B);
        assert!(state.free_shipping_achieved());
        assert!(state.free_item("sunnies").is_some_and(|p| p.achieved));
        assert!(state.free_item("front-pack").is_some_and(|p| !p.achieved));

        let next = state.next.as_ref().unwrap();
        assert_eq!(next.milestone.free_item_handle(), Some("front-pack"));
        assert_eq!(next.remaining, dec(30));
        assert_eq!(next.progress_percent, dec(80));
        assert!(state.has_progress);
        assert!(!state.all_achieved);
    }

    #[test]
    fn test_all_achieved() {
        let catalog = VariantCatalog::builtin();
        let state = evaluate(dec(150), catalog.resolve(Some(VARIANT_B)));
        assert!(state.all_achieved);
        assert!(state.next.is_none());
        assert!(!state.has_progress);
    }

    #[test]
    fn test_empty_cart_has_no_progress() {
        let catalog = VariantCatalog::builtin();
        let state = evaluate(Decimal::ZERO, catalog.resolve(Some(VARIANT_A)));
        assert!(state.milestones.iter().all(|p| !p.achieved));
        assert!(!state.has_progress);
        assert!(!state.all_achieved);
        assert_eq!(state.next.as_ref().map(|p| p.remaining), Some(dec(50)));
    }

    #[test]
    fn test_empty_variant_is_never_all_achieved() {
        let state = evaluate(dec(500), &Variant::new("empty", vec![]));
        assert!(state.milestones.is_empty());
        assert!(state.next.is_none());
        assert!(!state.all_achieved);
        assert!(!state.has_progress);
    }

    #[test]
    fn test_next_follows_variant_order() {
        // Presentation order, not threshold order
        let variant = Variant::new(
            "X",
            vec![
                Milestone::free_item(dec(150), "front-pack", "Front Pack", None),
                Milestone::shipping(dec(50)),
            ],
        );
        let state = evaluate(dec(10), &variant);
        assert_eq!(
            state.next.unwrap().milestone.free_item_handle(),
            Some("front-pack")
        );
    }

    #[test]
    fn test_extreme_amounts_do_not_panic() {
        let m = Milestone::shipping(dec(100));
        let p = evaluate_milestone(Decimal::MIN, &m);
        assert!(!p.achieved);
        assert_eq!(p.remaining, Decimal::MAX);
        assert_eq!(p.progress_percent, Decimal::ZERO);

        let p = evaluate_milestone(Decimal::MAX, &m);
        assert!(p.achieved);
        assert_eq!(p.remaining, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn prop_achieved_iff_subtotal_reaches_threshold(
            subtotal in -10_000_000i64..10_000_000,
            threshold in 0i64..10_000_000,
        ) {
            let s = Decimal::new(subtotal, 2);
            let t = Decimal::new(threshold, 2);
            let p = evaluate_milestone(s, &Milestone::shipping(t));

            prop_assert_eq!(p.achieved, s >= t);
            prop_assert_eq!(p.eligible, p.achieved);
            prop_assert_eq!(p.remaining, (t - s).max(Decimal::ZERO));
            prop_assert_eq!(p.remaining.is_zero(), p.achieved);
        }

        #[test]
        fn prop_next_is_first_unmet(
            subtotal in 0i64..30_000,
            thresholds in prop::collection::vec(0i64..30_000, 0..6),
        ) {
            let s = Decimal::new(subtotal, 2);
            let variant = Variant::new(
                "P",
                thresholds.iter().map(|t| Milestone::shipping(Decimal::new(*t, 2))).collect(),
            );
            let state = evaluate(s, &variant);

            let first_unmet = thresholds.iter().map(|t| Decimal::new(*t, 2)).find(|t| s < *t);
            prop_assert_eq!(state.next.as_ref().map(|p| p.milestone.threshold), first_unmet);
            prop_assert_eq!(state.all_achieved, !thresholds.is_empty() && first_unmet.is_none());
            prop_assert_eq!(state.has_progress, s > Decimal::ZERO && first_unmet.is_some());
        }
    }
}
