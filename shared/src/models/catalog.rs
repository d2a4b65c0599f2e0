//! Catalog collaborator data

use crate::cart::{MoneyV2, SelectedOption, option_value};
use serde::{Deserialize, Serialize};

/// Product variant as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVariant {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub available_for_sale: bool,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[serde(default)]
    pub price: Option<MoneyV2>,
}

impl CatalogVariant {
    pub fn option_value(&self, name: &str) -> Option<&str> {
        option_value(&self.selected_options, name)
    }
}

/// Product with its variants, in catalog order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

/// Concrete purchasable unit chosen for a free-item milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVariant {
    pub product_handle: String,
    pub variant_id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub selected_options: Vec<SelectedOption>,
    /// False when the selector missed and the default variant was used
    pub matched_selector: bool,
}

impl ResolvedVariant {
    pub fn from_catalog(handle: &str, variant: &CatalogVariant, matched_selector: bool) -> Self {
        Self {
            product_handle: handle.to_string(),
            variant_id: variant.id.clone(),
            title: variant.title.clone(),
            available_for_sale: variant.available_for_sale,
            selected_options: variant.selected_options.clone(),
            matched_selector,
        }
    }
}
