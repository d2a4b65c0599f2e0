//! In-memory cart store
//!
//! Behaves like the storefront cart API closely enough for end-to-end
//! reconciliation runs without a network:
//! - line costs are recomputed from a merchandise price table
//! - adding merchandise with identical attributes merges into the existing line
//! - unknown merchandise or line ids come back as user errors, not failures

use super::cart_store::CartStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::cart::{
    CartAttributes, CartCost, CartDiscountCode, CartLine, CartLineInput, CartLineUpdateInput,
    CartMutation, CartSnapshot, CartUserError, LineCost, Merchandise, MoneyV2,
};
use shared::error::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Price table entry for one purchasable variant
#[derive(Debug, Clone)]
pub struct PricedMerchandise {
    pub merchandise: Merchandise,
    pub unit_price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

pub struct MemoryCartStore {
    carts: RwLock<HashMap<String, CartSnapshot>>,
    prices: DashMap<String, PricedMerchandise>,
    currency_code: String,
    mutations: AtomicU64,
}

impl MemoryCartStore {
    pub fn new(currency_code: impl Into<String>) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            prices: DashMap::new(),
            currency_code: currency_code.into(),
            mutations: AtomicU64::new(0),
        }
    }

    /// Register a purchasable variant
    pub fn register(
        &self,
        merchandise: Merchandise,
        unit_price: Decimal,
        compare_at_price: Option<Decimal>,
    ) {
        self.prices.insert(
            merchandise.id.clone(),
            PricedMerchandise {
                merchandise,
                unit_price,
                compare_at_price,
            },
        );
    }

    /// Create an empty cart, replacing any cart with the same id
    pub fn create_cart(&self, cart_id: impl Into<String>) -> CartSnapshot {
        let cart = CartSnapshot::new(cart_id);
        self.carts.write().insert(cart.id.clone(), cart.clone());
        cart
    }

    /// Current cart state without going through the trait
    pub fn snapshot(&self, cart_id: &str) -> Option<CartSnapshot> {
        self.carts.read().get(cart_id).cloned()
    }

    /// Number of mutations applied since creation
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    fn money(&self, amount: Decimal) -> MoneyV2 {
        MoneyV2::new(amount, self.currency_code.clone())
    }

    fn priced_line(&self, input: &CartLineInput) -> Option<CartLine> {
        let entry = self.prices.get(&input.merchandise_id)?;
        Some(CartLine {
            id: format!("gid://cart-line/{}", uuid::Uuid::new_v4()),
            merchandise: entry.merchandise.clone(),
            quantity: input.quantity,
            cost: None,
            attributes: input.attributes.clone(),
        })
    }

    /// Recompute line costs, cart cost and total quantity
    fn recompute(&self, cart: &mut CartSnapshot) {
        let mut subtotal = Decimal::ZERO;
        for line in &mut cart.lines {
            let Some(entry) = self.prices.get(&line.merchandise.id) else {
                continue;
            };
            let total = entry.unit_price * Decimal::from(line.quantity);
            subtotal += total;
            line.cost = Some(LineCost {
                total_amount: Some(self.money(total)),
                amount_per_quantity: Some(self.money(entry.unit_price)),
                compare_at_amount_per_quantity: entry.compare_at_price.map(|p| self.money(p)),
            });
        }
        cart.total_quantity = cart.lines.iter().map(|l| l.quantity).sum();
        cart.cost = Some(CartCost {
            subtotal_amount: Some(self.money(subtotal)),
            total_amount: Some(self.money(subtotal)),
        });
    }

    /// Run a mutation against one cart under the write lock
    fn mutate<F>(&self, cart_id: &str, f: F) -> AppResult<CartMutation>
    where
        F: FnOnce(&mut CartSnapshot) -> Vec<CartUserError>,
    {
        let mut carts = self.carts.write();
        let cart = carts
            .get_mut(cart_id)
            .ok_or_else(|| AppError::cart_not_found(cart_id))?;

        let user_errors = f(cart);
        self.recompute(cart);
        self.mutations.fetch_add(1, Ordering::Relaxed);

        Ok(CartMutation {
            cart: cart.clone(),
            warnings: vec![],
            user_errors,
        })
    }
}

impl Default for MemoryCartStore {
    fn default() -> Self {
        Self::new("USD")
    }
}

fn user_error(field: &str, message: String) -> CartUserError {
    CartUserError {
        code: Some("INVALID".to_string()),
        field: Some(vec![field.to_string()]),
        message,
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn get(&self, cart_id: &str) -> AppResult<CartSnapshot> {
        self.snapshot(cart_id)
            .ok_or_else(|| AppError::cart_not_found(cart_id))
    }

    async fn add_lines(&self, cart_id: &str, lines: &[CartLineInput]) -> AppResult<CartMutation> {
        self.mutate(cart_id, |cart| {
            let mut errors = Vec::new();
            for input in lines {
                if input.quantity == 0 {
                    errors.push(user_error("quantity", "Quantity must be positive".to_string()));
                    continue;
                }
                if let Some(existing) = cart.lines.iter_mut().find(|l| {
                    l.merchandise.id == input.merchandise_id && l.attributes == input.attributes
                }) {
                    existing.quantity += input.quantity;
                    continue;
                }
                match self.priced_line(input) {
                    Some(line) => cart.lines.push(line),
                    None => errors.push(user_error(
                        "merchandiseId",
                        format!("Merchandise {} does not exist", input.merchandise_id),
                    )),
                }
            }
            errors
        })
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: &[CartLineUpdateInput],
    ) -> AppResult<CartMutation> {
        self.mutate(cart_id, |cart| {
            let mut errors = Vec::new();
            for update in lines {
                let Some(line) = cart.lines.iter_mut().find(|l| l.id == update.id) else {
                    errors.push(user_error("id", format!("Line {} does not exist", update.id)));
                    continue;
                };
                if let Some(quantity) = update.quantity {
                    line.quantity = quantity;
                }
                if let Some(attributes) = &update.attributes {
                    line.attributes = attributes.clone();
                }
            }
            cart.lines.retain(|l| l.quantity > 0);
            errors
        })
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[String]) -> AppResult<CartMutation> {
        self.mutate(cart_id, |cart| {
            let errors = line_ids
                .iter()
                .filter(|id| cart.line(id).is_none())
                .map(|id| user_error("lineIds", format!("Line {} does not exist", id)))
                .collect();
            cart.lines.retain(|l| !line_ids.contains(&l.id));
            errors
        })
    }

    async fn update_attributes(
        &self,
        cart_id: &str,
        attributes: &CartAttributes,
    ) -> AppResult<CartMutation> {
        self.mutate(cart_id, |cart| {
            cart.attributes = attributes.clone();
            vec![]
        })
    }

    async fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: &[String],
    ) -> AppResult<CartMutation> {
        self.mutate(cart_id, |cart| {
            cart.discount_codes = codes
                .iter()
                .map(|code| CartDiscountCode {
                    code: code.clone(),
                    applicable: true,
                })
                .collect();
            vec![]
        })
    }
}
