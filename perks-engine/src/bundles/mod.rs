//! Bundle Grouper & Validator
//!
//! Buckets bundle-tagged lines by `_BUNDLE_ID` (falling back to
//! `_BUNDLE_NAME`), prices each bucket and checks it against the required
//! bundle size. Incomplete bundles are still returned so the cart can render
//! them; only [`is_any_bundle_complete`] drives the discount code.

use crate::money::{checked_total, line_amount, line_original_amount, shortfall};
use shared::cart::CartLine;
use shared::models::{BundleGroup, BundleGrouping, BundleRules};

/// Partition lines into bundle groups (first-appearance order) and the rest
pub fn group_lines(lines: &[CartLine], rules: &BundleRules) -> BundleGrouping {
    let mut buckets: Vec<(String, Vec<CartLine>)> = Vec::new();
    let mut ungrouped = Vec::new();

    for line in lines {
        if line.is_free() {
            if line.attributes.bundle_name.is_some() || line.attributes.bundle_id.is_some() {
                tracing::warn!(
                    line_id = %line.id,
                    "Free line carries bundle tags, ignoring bundle membership"
                );
            }
            ungrouped.push(line.clone());
            continue;
        }

        match line.attributes.bundle_key() {
            Some(key) => match buckets.iter_mut().find(|(k, _)| k == key) {
                Some((_, members)) => members.push(line.clone()),
                None => buckets.push((key.to_string(), vec![line.clone()])),
            },
            None => ungrouped.push(line.clone()),
        }
    }

    let groups = buckets
        .into_iter()
        .map(|(key, members)| build_group(key, members, rules))
        .collect();

    BundleGrouping { groups, ungrouped }
}

fn build_group(bundle_id: String, lines: Vec<CartLine>, rules: &BundleRules) -> BundleGroup {
    let bundle_name = lines
        .iter()
        .find_map(|l| l.attributes.bundle_name.clone())
        .unwrap_or_else(|| bundle_id.clone());

    let total_quantity = lines.iter().fold(0u32, |n, l| n.saturating_add(l.quantity));
    let price = checked_total(lines.iter().map(line_amount));
    let original_price = checked_total(lines.iter().map(line_original_amount));
    let savings = shortfall(original_price, price);
    let required_size = rules.required_size(Some(&bundle_name));
    let summary = summarize(&lines, &rules.summary_option);

    BundleGroup {
        complete: total_quantity == required_size,
        bundle_id,
        bundle_name,
        lines,
        total_quantity,
        required_size,
        price,
        original_price,
        savings,
        summary,
    }
}

/// Composition summary over one option, e.g. "Black ×2, White"
///
/// Counts are weighted by quantity and listed in first-seen order. Lines
/// without the option are left out.
pub fn summarize(lines: &[CartLine], option_name: &str) -> String {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for line in lines {
        let Some(value) = line.option_value(option_name) else {
            continue;
        };
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count = count.saturating_add(line.quantity),
            None => counts.push((value, line.quantity)),
        }
    }

    counts
        .into_iter()
        .map(|(value, count)| {
            if count > 1 {
                format!("{} ×{}", value, count)
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether at least one bundle meets its required size
pub fn is_any_bundle_complete(groups: &[BundleGroup]) -> bool {
    groups.iter().any(|g| g.complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::cart::{LineAttributes, LineCost, Merchandise, MoneyV2, SelectedOption};
    use shared::models::MENS_TSHIRT_BUNDLE;

    fn usd(amount: &str) -> Option<MoneyV2> {
        Some(MoneyV2 {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        })
    }

    fn tee(id: &str, color: &str, quantity: u32, bundle_id: Option<&str>) -> CartLine {
        let unit = 24;
        CartLine {
            id: id.to_string(),
            merchandise: Merchandise {
                id: format!("tee-{}", color.to_lowercase()),
                product_handle: "mens-tee".to_string(),
                selected_options: vec![
                    SelectedOption::new("Color", color),
                    SelectedOption::new("Size", "M"),
                ],
                ..Default::default()
            },
            quantity,
            cost: Some(LineCost {
                total_amount: usd(&(unit * quantity).to_string()),
                amount_per_quantity: usd(&unit.to_string()),
                compare_at_amount_per_quantity: usd("30"),
            }),
            attributes: match bundle_id {
                Some(id) => LineAttributes::bundle(MENS_TSHIRT_BUNDLE, id),
                None => LineAttributes::default(),
            },
        }
    }

    #[test]
    fn test_complete_bundle() {
        let lines = vec![
            tee("1", "Black", 2, Some("b-1")),
            tee("2", "White", 1, Some("b-1")),
        ];
        let grouping = group_lines(&lines, &BundleRules::default());

        assert_eq!(grouping.groups.len(), 1);
        assert!(grouping.ungrouped.is_empty());

        let group = &grouping.groups[0];
        assert_eq!(group.bundle_id, "b-1");
        assert_eq!(group.bundle_name, MENS_TSHIRT_BUNDLE);
        assert_eq!(group.total_quantity, 3);
        assert_eq!(group.required_size, 3);
        assert!(group.complete);
        assert_eq!(group.price, Decimal::from(72));
        assert_eq!(group.original_price, Decimal::from(90));
        assert_eq!(group.savings, Decimal::from(18));
        assert_eq!(group.summary, "Black ×2, White");
        assert!(is_any_bundle_complete(&grouping.groups));
    }

    #[test]
    fn test_incomplete_bundle_still_rendered() {
        let lines = vec![tee("1", "Black", 2, Some("b-1")), tee("2", "Navy", 1, None)];
        let grouping = group_lines(&lines, &BundleRules::default());

        assert_eq!(grouping.groups.len(), 1);
        assert!(!grouping.groups[0].complete);
        assert_eq!(grouping.groups[0].summary, "Black ×2");
        assert_eq!(grouping.ungrouped.len(), 1);
        assert!(!is_any_bundle_complete(&grouping.groups));
    }

    #[test]
    fn test_oversized_bundle_is_not_complete() {
        let lines = vec![tee("1", "Black", 4, Some("b-1"))];
        let grouping = group_lines(&lines, &BundleRules::default());
        assert!(!grouping.groups[0].complete);
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let lines = vec![
            tee("1", "Black", 1, Some("b-2")),
            tee("2", "White", 1, Some("b-1")),
            tee("3", "Grey", 1, Some("b-2")),
        ];
        let grouping = group_lines(&lines, &BundleRules::default());
        let ids: Vec<_> = grouping.groups.iter().map(|g| g.bundle_id.as_str()).collect();
        assert_eq!(ids, vec!["b-2", "b-1"]);
        assert_eq!(grouping.groups[0].lines.len(), 2);
    }

    #[test]
    fn test_name_only_lines_group_by_name() {
        let mut line = tee("1", "Black", 3, None);
        line.attributes.bundle_name = Some(MENS_TSHIRT_BUNDLE.to_string());
        let grouping = group_lines(&[line], &BundleRules::default());

        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].bundle_id, MENS_TSHIRT_BUNDLE);
        assert!(grouping.groups[0].complete);
    }

    #[test]
    fn test_free_line_with_bundle_tags_is_ungrouped() {
        let mut gift = tee("1", "Black", 1, Some("b-1"));
        gift.attributes.free_item = true;
        let grouping = group_lines(&[gift, tee("2", "White", 2, Some("b-1"))], &BundleRules::default());

        assert_eq!(grouping.ungrouped.len(), 1);
        assert_eq!(grouping.groups[0].total_quantity, 2);
        assert!(!grouping.groups[0].complete);
    }

    #[test]
    fn test_savings_never_negative() {
        let mut line = tee("1", "Black", 3, Some("b-1"));
        if let Some(cost) = line.cost.as_mut() {
            cost.compare_at_amount_per_quantity = usd("10");
        }
        let grouping = group_lines(&[line], &BundleRules::default());
        assert_eq!(grouping.groups[0].savings, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_amounts_do_not_panic() {
        let mut lines = vec![tee("1", "Black", 1, Some("b-1")), tee("2", "White", 2, Some("b-1"))];
        for line in &mut lines {
            if let Some(cost) = line.cost.as_mut() {
                cost.total_amount = usd("5e28");
                cost.compare_at_amount_per_quantity = usd("5e28");
            }
        }
        let grouping = group_lines(&lines, &BundleRules::default());
        let group = &grouping.groups[0];
        assert!(group.complete);
        assert_eq!(group.price, Decimal::from_scientific("5e28").unwrap());
        assert_eq!(group.savings, Decimal::ZERO);
    }

    #[test]
    fn test_configured_size() {
        let mut rules = BundleRules::default();
        rules.sizes.insert(MENS_TSHIRT_BUNDLE.to_string(), 2);
        let lines = vec![tee("1", "Black", 1, Some("b-1")), tee("2", "White", 1, Some("b-1"))];
        assert!(group_lines(&lines, &rules).any_complete());
    }

    #[test]
    fn test_summary_skips_lines_without_option() {
        let mut plain = tee("2", "White", 1, Some("b-1"));
        plain.merchandise.selected_options.clear();
        let lines = vec![tee("1", "Black", 1, Some("b-1")), plain];
        assert_eq!(summarize(&lines, "color"), "Black");
    }
}
