//! Cart store seam

use async_trait::async_trait;
use shared::cart::{CartAttributes, CartLineInput, CartLineUpdateInput, CartMutation, CartSnapshot};
use shared::error::AppResult;

/// External system of record for cart state
///
/// Every mutation returns the resulting cart so callers can keep working from
/// the latest snapshot. Per-cart serialization of concurrent writers is the
/// store's job.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch the current cart
    async fn get(&self, cart_id: &str) -> AppResult<CartSnapshot>;

    async fn add_lines(&self, cart_id: &str, lines: &[CartLineInput]) -> AppResult<CartMutation>;

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: &[CartLineUpdateInput],
    ) -> AppResult<CartMutation>;

    async fn remove_lines(&self, cart_id: &str, line_ids: &[String]) -> AppResult<CartMutation>;

    /// Replace the cart attribute set
    ///
    /// Callers send the full merged set, so this behaves as an upsert of the
    /// keys they changed.
    async fn update_attributes(
        &self,
        cart_id: &str,
        attributes: &CartAttributes,
    ) -> AppResult<CartMutation>;

    /// Replace the applied discount codes
    async fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: &[String],
    ) -> AppResult<CartMutation>;
}
