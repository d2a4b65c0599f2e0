//! Catalog seam and adapters

use super::{http_client, status_error, transport_error};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::CatalogProduct;
use std::time::Duration;

/// Product lookup by handle
#[async_trait]
pub trait Catalog: Send + Sync {
    /// `Ok(None)` when no product has this handle
    async fn product_by_handle(&self, handle: &str) -> AppResult<Option<CatalogProduct>>;
}

/// In-memory catalog keyed by handle
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: DashMap<String, CatalogProduct>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: CatalogProduct) {
        self.products.insert(product.handle.clone(), product);
    }

    pub fn remove(&self, handle: &str) -> Option<CatalogProduct> {
        self.products.remove(handle).map(|(_, p)| p)
    }

    /// Flip availability of one variant, e.g. when it sells out
    pub fn set_available(&self, handle: &str, variant_id: &str, available: bool) -> bool {
        let Some(mut product) = self.products.get_mut(handle) else {
            return false;
        };
        match product.variants.iter_mut().find(|v| v.id == variant_id) {
            Some(variant) => {
                variant.available_for_sale = available;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn product_by_handle(&self, handle: &str) -> AppResult<Option<CatalogProduct>> {
        Ok(self.products.get(handle).map(|p| p.clone()))
    }
}

/// REST catalog: `GET {base}/products/{handle}`, 404 means unknown product
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn product_url(&self, handle: &str) -> String {
        format!("{}/products/{}", self.base_url, urlencoding::encode(handle))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn product_by_handle(&self, handle: &str) -> AppResult<Option<CatalogProduct>> {
        let url = self.product_url(handle);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| catalog_error(transport_error(e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(catalog_error(status_error(status, text)));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| catalog_error(transport_error(e)))
    }
}

/// Fold transport failures into catalog codes
fn catalog_error(err: AppError) -> AppError {
    match err.code {
        ErrorCode::TimeoutError => AppError::with_message(ErrorCode::CatalogTimeout, err.message),
        ErrorCode::NetworkError | ErrorCode::InternalError => {
            AppError::catalog_unavailable(err.message)
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::CatalogVariant;

    fn product() -> CatalogProduct {
        CatalogProduct {
            handle: "sunnies".to_string(),
            title: "Sunnies".to_string(),
            variants: vec![CatalogVariant {
                id: "sunnies-black".to_string(),
                title: "Black".to_string(),
                available_for_sale: true,
                selected_options: vec![],
                price: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_memory_lookup() {
        let catalog = MemoryCatalog::new();
        catalog.insert(product());

        let found = catalog.product_by_handle("sunnies").await.unwrap();
        assert_eq!(found.unwrap().variants.len(), 1);
        assert!(catalog.product_by_handle("hat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_available() {
        let catalog = MemoryCatalog::new();
        catalog.insert(product());

        assert!(catalog.set_available("sunnies", "sunnies-black", false));
        assert!(!catalog.set_available("sunnies", "missing", false));
        let found = catalog.product_by_handle("sunnies").await.unwrap().unwrap();
        assert!(!found.variants[0].available_for_sale);
    }

    #[test]
    fn test_catalog_error_mapping() {
        let err = catalog_error(AppError::with_message(ErrorCode::TimeoutError, "slow"));
        assert_eq!(err.code, ErrorCode::CatalogTimeout);

        let err = catalog_error(AppError::network("refused"));
        assert_eq!(err.code, ErrorCode::CatalogUnavailable);

        let err = catalog_error(AppError::invalid_format("bad json"));
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_product_url() {
        let catalog = HttpCatalog::new("http://catalog.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            catalog.product_url("front-pack"),
            "http://catalog.local/products/front-pack"
        );
        assert_eq!(
            catalog.product_url("tote/limited?v=2"),
            "http://catalog.local/products/tote%2Flimited%3Fv%3D2"
        );
    }
}
