//! Experiment variants
//!
//! The experiment assignment hands us a variant id; the catalog maps it onto a
//! configured milestone set. Unknown ids never fail, they fall back to the
//! first configured variant.

use rust_decimal::Decimal;
use shared::models::{Milestone, Variant};

/// Control: free shipping only
pub const VARIANT_A: &str = "A";
/// Treatment: free shipping plus free gifts
pub const VARIANT_B: &str = "B";

/// Variants the engine ships with
pub fn builtin_variants() -> Vec<Variant> {
    vec![
        Variant {
            id: VARIANT_A.to_string(),
            name: Some("Free shipping".to_string()),
            milestones: vec![Milestone::shipping(Decimal::from(50))],
        },
        Variant {
            id: VARIANT_B.to_string(),
            name: Some("Free shipping and gifts".to_string()),
            milestones: vec![
                Milestone::shipping(Decimal::from(100)),
                Milestone::free_item(Decimal::from(100), "sunnies", "Black Sunnies", Some("Black")),
                Milestone::free_item(Decimal::from(150), "front-pack", "Front Pack", None),
            ],
        },
    ]
}

/// Configured variants, first entry is the default
#[derive(Debug, Clone)]
pub struct VariantCatalog {
    variants: Vec<Variant>,
}

impl VariantCatalog {
    /// Build from configured variants, the built-in set when empty
    pub fn new(variants: Vec<Variant>) -> Self {
        if variants.is_empty() {
            tracing::warn!("No variants configured, using built-in variants");
            return Self::builtin();
        }
        Self { variants }
    }

    pub fn builtin() -> Self {
        Self {
            variants: builtin_variants(),
        }
    }

    pub fn default_variant(&self) -> &Variant {
        // Non-empty by construction
        &self.variants[0]
    }

    pub fn get(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Variant for an assignment, falling back to the default
    pub fn resolve(&self, id: Option<&str>) -> &Variant {
        match id {
            Some(id) => self.get(id).unwrap_or_else(|| {
                let fallback = self.default_variant();
                tracing::debug!(
                    requested = %id,
                    fallback = %fallback.id,
                    "Unknown variant, using default"
                );
                fallback
            }),
            None => self.default_variant(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.id.as_str())
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_variants() {
        let catalog = VariantCatalog::builtin();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec![VARIANT_A, VARIANT_B]);

        let b = catalog.resolve(Some(VARIANT_B));
        assert_eq!(b.milestones.len(), 3);
        assert_eq!(b.shipping_milestone().unwrap().threshold, Decimal::from(100));
    }

    #[test]
    fn test_unknown_variant_falls_back_to_first() {
        let catalog = VariantCatalog::builtin();
        assert_eq!(catalog.resolve(Some("Z")).id, VARIANT_A);
        assert_eq!(catalog.resolve(None).id, VARIANT_A);
    }

    #[test]
    fn test_empty_config_uses_builtin() {
        let catalog = VariantCatalog::new(vec![]);
        assert_eq!(catalog.default_variant().id, VARIANT_A);
    }

    #[test]
    fn test_custom_default() {
        let catalog = VariantCatalog::new(vec![Variant::new(
            "C",
            vec![Milestone::shipping(Decimal::from(75))],
        )]);
        assert_eq!(catalog.resolve(Some(VARIANT_B)).id, "C");
    }
}
