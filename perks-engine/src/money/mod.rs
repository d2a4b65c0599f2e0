//! Subtotal and line amount calculation
//!
//! All arithmetic is done in `Decimal`. Amounts arrive as strings from the
//! cart store; anything missing or malformed counts as zero so a bad line can
//! never fail a reconciliation pass. Sums are checked: a line that would push
//! a total past the `Decimal` range is counted as zero.

use rust_decimal::prelude::*;
use shared::cart::{CartLine, MoneyV2};

/// Rounding for derived display values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a derived amount for display
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

fn parse(money: Option<&MoneyV2>) -> Option<Decimal> {
    money.and_then(MoneyV2::to_decimal)
}

/// Current cost of a line (`cost.total_amount`), zero when absent
pub fn line_amount(line: &CartLine) -> Decimal {
    let total = line.cost.as_ref().and_then(|c| c.total_amount.as_ref());
    match parse(total) {
        Some(amount) => amount,
        None => {
            if total.is_some() {
                tracing::debug!(line_id = %line.id, "Malformed line total, counting as zero");
            }
            Decimal::ZERO
        }
    }
}

/// Undiscounted cost of a line
///
/// Compare-at unit price x quantity, else current unit price x quantity,
/// else the current line total.
pub fn line_original_amount(line: &CartLine) -> Decimal {
    let Some(cost) = line.cost.as_ref() else {
        return Decimal::ZERO;
    };
    parse(cost.compare_at_amount_per_quantity.as_ref())
        .or_else(|| parse(cost.amount_per_quantity.as_ref()))
        .and_then(|unit| unit.checked_mul(Decimal::from(line.quantity)))
        .unwrap_or_else(|| line_amount(line))
}

/// Overflow-safe sum, amounts that do not fit are skipped
pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |total, amount| match total.checked_add(amount) {
            Some(sum) => sum,
            None => {
                tracing::warn!(%amount, "Amount overflows total, counting as zero");
                total
            }
        })
}

/// `max(0, target - value)`, saturating at `Decimal::MAX`
pub fn shortfall(target: Decimal, value: Decimal) -> Decimal {
    match target.checked_sub(value) {
        Some(diff) => diff.max(Decimal::ZERO),
        None if target > value => Decimal::MAX,
        None => Decimal::ZERO,
    }
}

/// Sum of current line costs, excluding engine-injected free lines
///
/// This is the only number milestone evaluation looks at. Free lines are
/// excluded so a gift can never hold its own threshold up.
pub fn reconciliation_subtotal(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .filter(|line| !line.is_free())
        .fold(Decimal::ZERO, |total, line| {
            let amount = line_amount(line);
            match total.checked_add(amount) {
                Some(sum) => sum,
                None => {
                    tracing::warn!(line_id = %line.id, %amount, "Line total overflows subtotal, counting as zero");
                    total
                }
            }
        })
}

/// Share of `threshold` reached by `subtotal`, clamped to 0..=100
pub fn progress_percent(subtotal: Decimal, threshold: Decimal) -> Decimal {
    if threshold <= Decimal::ZERO {
        return ONE_HUNDRED;
    }
    // Overflow only happens far beyond the threshold
    let pct = subtotal
        .max(Decimal::ZERO)
        .checked_div(threshold)
        .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
        .unwrap_or(ONE_HUNDRED);
    round_money(pct.min(ONE_HUNDRED))
}

#[cfg(test)]
mod tests;
