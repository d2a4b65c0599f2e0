//! Free-Item Resolver
//!
//! Maps a milestone's product handle (plus an optional selector such as a
//! color) to a concrete purchasable variant. Resolution never fails the
//! reconciliation pass: unknown products, sold-out products, catalog errors
//! and catalog timeouts all resolve to `None` and the milestone is skipped.

use crate::services::Catalog;
use shared::error::AppError;
use shared::models::{CatalogProduct, ResolvedVariant};
use std::sync::Arc;
use std::time::Duration;

/// Default option a selector is matched against
pub const DEFAULT_SELECTOR_OPTION: &str = "Color";

/// Pick a variant from a product
///
/// 1. An available variant whose selector option equals `selector`
///    (case-insensitive)
/// 2. Otherwise the first available variant in catalog order
/// 3. `None` when nothing is available
pub fn select_variant(
    product: &CatalogProduct,
    selector: Option<&str>,
    selector_option: &str,
) -> Option<ResolvedVariant> {
    if let Some(wanted) = selector {
        let matched = product.variants.iter().find(|v| {
            v.available_for_sale
                && v
                    .option_value(selector_option)
                    .is_some_and(|value| value.eq_ignore_ascii_case(wanted.trim()))
        });
        if let Some(variant) = matched {
            return Some(ResolvedVariant::from_catalog(&product.handle, variant, true));
        }
        tracing::debug!(
            handle = %product.handle,
            selector = %wanted,
            "Selector matched no available variant, using default"
        );
    }

    product
        .variants
        .iter()
        .find(|v| v.available_for_sale)
        .map(|v| ResolvedVariant::from_catalog(&product.handle, v, selector.is_none()))
}

/// Catalog-backed resolver with a bounded lookup time
#[derive(Clone)]
pub struct FreeItemResolver {
    catalog: Arc<dyn Catalog>,
    selector_option: String,
    timeout: Duration,
}

impl FreeItemResolver {
    pub fn new(catalog: Arc<dyn Catalog>, selector_option: impl Into<String>, timeout: Duration) -> Self {
        Self {
            catalog,
            selector_option: selector_option.into(),
            timeout,
        }
    }

    /// Resolve a handle and selector to a purchasable variant
    pub async fn resolve(&self, handle: &str, selector: Option<&str>) -> Option<ResolvedVariant> {
        let product = match self.lookup(handle).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                tracing::warn!(%handle, "Free item product not found in catalog");
                return None;
            }
            Err(e) => {
                tracing::warn!(%handle, code = %e.code, error = %e, "Free item lookup failed");
                return None;
            }
        };

        let resolved = select_variant(&product, selector, &self.selector_option);
        if resolved.is_none() {
            tracing::warn!(%handle, "Free item product is out of stock");
        }
        resolved
    }

    async fn lookup(&self, handle: &str) -> Result<Option<CatalogProduct>, AppError> {
        match tokio::time::timeout(self.timeout, self.catalog.product_by_handle(handle)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::catalog_timeout(handle)),
        }
    }
}
