use super::*;
use proptest::prelude::*;
use shared::cart::{LineAttributes, LineCost, Merchandise};

fn money(amount: &str) -> Option<MoneyV2> {
    Some(MoneyV2 {
        amount: amount.to_string(),
        currency_code: "USD".to_string(),
    })
}

fn line(id: &str, total: Option<&str>, quantity: u32) -> CartLine {
    CartLine {
        id: id.to_string(),
        merchandise: Merchandise {
            id: format!("variant-{}", id),
            ..Default::default()
        },
        quantity,
        cost: total.map(|t| LineCost {
            total_amount: money(t),
            ..Default::default()
        }),
        attributes: LineAttributes::default(),
    }
}

fn free_line(id: &str, total: &str) -> CartLine {
    let mut l = line(id, Some(total), 1);
    l.attributes = LineAttributes::free_item("sunnies", Decimal::ONE_HUNDRED);
    l
}

#[test]
fn test_subtotal_sums_paid_lines() {
    let lines = vec![line("1", Some("40.00"), 1), line("2", Some("19.99"), 2)];
    assert_eq!(reconciliation_subtotal(&lines), Decimal::new(5999, 2));
}

#[test]
fn test_subtotal_excludes_free_lines() {
    // A free line priced at 50 must not move the subtotal
    let lines = vec![line("1", Some("90.00"), 1), free_line("2", "50.00")];
    assert_eq!(reconciliation_subtotal(&lines), Decimal::from(90));
}

#[test]
fn test_subtotal_of_empty_cart_is_zero() {
    assert_eq!(reconciliation_subtotal(&[]), Decimal::ZERO);
}

#[test]
fn test_missing_or_malformed_cost_counts_as_zero() {
    let lines = vec![
        line("1", None, 1),
        line("2", Some("not-a-number"), 1),
        line("3", Some(""), 1),
        line("4", Some("25"), 1),
    ];
    assert_eq!(reconciliation_subtotal(&lines), Decimal::from(25));
}

#[test]
fn test_decimal_precision() {
    // 0.1 + 0.2 stays exact
    let lines = vec![line("1", Some("0.1"), 1), line("2", Some("0.2"), 1)];
    assert_eq!(reconciliation_subtotal(&lines), Decimal::new(3, 1));

    let many: Vec<CartLine> = (0..1000).map(|i| line(&i.to_string(), Some("0.01"), 1)).collect();
    assert_eq!(reconciliation_subtotal(&many), Decimal::from(10));
}

#[test]
fn test_original_amount_prefers_compare_at() {
    let mut l = line("1", Some("48.00"), 2);
    if let Some(cost) = l.cost.as_mut() {
        cost.amount_per_quantity = money("24.00");
        cost.compare_at_amount_per_quantity = money("30.00");
    }
    assert_eq!(line_original_amount(&l), Decimal::from(60));
}

#[test]
fn test_original_amount_falls_back_to_unit_price() {
    let mut l = line("1", Some("48.00"), 2);
    if let Some(cost) = l.cost.as_mut() {
        cost.amount_per_quantity = money("24.00");
        cost.compare_at_amount_per_quantity = money("n/a");
    }
    assert_eq!(line_original_amount(&l), Decimal::from(48));
}

#[test]
fn test_original_amount_falls_back_to_total() {
    let l = line("1", Some("48.00"), 2);
    assert_eq!(line_original_amount(&l), Decimal::from(48));
    assert_eq!(line_original_amount(&line("2", None, 1)), Decimal::ZERO);
}

#[test]
fn test_progress_percent() {
    assert_eq!(progress_percent(Decimal::from(40), Decimal::from(100)), Decimal::from(40));
    assert_eq!(progress_percent(Decimal::from(120), Decimal::from(100)), Decimal::from(100));
    assert_eq!(progress_percent(Decimal::ZERO, Decimal::ZERO), Decimal::from(100));
    // 1/3 rounds to 2dp
    assert_eq!(
        progress_percent(Decimal::from(50), Decimal::from(150)),
        Decimal::new(3333, 2)
    );
}

#[test]
fn test_round_money_half_away_from_zero() {
    assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
    assert_eq!(round_money(Decimal::new(-1005, 3)), Decimal::new(-101, 2));
}

#[test]
fn test_overflowing_line_counts_as_zero() {
    let huge = Decimal::from_scientific("5e28").unwrap();
    let lines = vec![
        line("1", Some("5e28"), 1),
        line("2", Some("5e28"), 1),
        line("3", Some("10"), 1),
    ];
    assert_eq!(reconciliation_subtotal(&lines), huge + Decimal::from(10));
}

#[test]
fn test_original_amount_overflow_falls_back_to_total() {
    let mut l = line("1", Some("10"), 2);
    if let Some(cost) = l.cost.as_mut() {
        cost.compare_at_amount_per_quantity = money("5e28");
    }
    assert_eq!(line_original_amount(&l), Decimal::from(10));
}

#[test]
fn test_checked_helpers_saturate() {
    assert_eq!(checked_total([Decimal::MAX, Decimal::ONE, Decimal::ONE]), Decimal::MAX);
    assert_eq!(shortfall(Decimal::MAX, Decimal::MIN), Decimal::MAX);
    assert_eq!(shortfall(Decimal::MIN, Decimal::MAX), Decimal::ZERO);
    assert_eq!(shortfall(Decimal::from(50), Decimal::new(4999, 2)), Decimal::new(1, 2));
    assert_eq!(progress_percent(Decimal::MAX, Decimal::new(1, 28)), Decimal::from(100));
}

fn arb_line() -> impl Strategy<Value = (Option<i64>, bool)> {
    // None is a malformed amount
    (prop::option::of(0i64..10_000_000), any::<bool>())
}

fn build_lines(specs: &[(Option<i64>, bool)]) -> Vec<CartLine> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (cents, free))| {
            let amount = cents
                .map(|c| Decimal::new(c, 2).to_string())
                .unwrap_or_else(|| "garbage".to_string());
            let mut l = line(&i.to_string(), Some(&amount), 1);
            if *free {
                l.attributes = LineAttributes::free_item("sunnies", Decimal::ONE_HUNDRED);
            }
            l
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_subtotal_is_sum_of_paid_lines(specs in prop::collection::vec(arb_line(), 0..20)) {
        let lines = build_lines(&specs);
        let expected: Decimal = specs
            .iter()
            .filter(|(_, free)| !free)
            .filter_map(|(cents, _)| cents.map(|c| Decimal::new(c, 2)))
            .sum();
        prop_assert_eq!(reconciliation_subtotal(&lines), expected);

        // Dropping every free line changes nothing
        let paid: Vec<CartLine> = lines.iter().filter(|l| !l.is_free()).cloned().collect();
        prop_assert_eq!(reconciliation_subtotal(&paid), expected);
    }

    #[test]
    fn prop_progress_percent_in_range(subtotal in -1_000_000i64..1_000_000, threshold in 0i64..1_000_000) {
        let pct = progress_percent(Decimal::new(subtotal, 2), Decimal::new(threshold, 2));
        prop_assert!(pct >= Decimal::ZERO && pct <= Decimal::from(100));
    }
}
