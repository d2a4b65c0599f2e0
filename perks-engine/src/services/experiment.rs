//! Experiment assignment seam
//!
//! Assignment and randomization belong to the experiment system. The engine
//! only asks "which variant for this key" once per request and passes the
//! answer along as a plain value.

use dashmap::DashMap;

pub trait ExperimentAssignment: Send + Sync {
    /// Variant id for an assignment key (cart or visitor id), `fallback` when unassigned
    fn variant_for(&self, key: &str, fallback: &str) -> String;
}

/// Fixed assignments: per-key overrides over an optional global variant
#[derive(Debug, Default)]
pub struct StaticAssignment {
    overrides: DashMap<String, String>,
    default_variant: Option<String>,
}

impl StaticAssignment {
    pub fn new(default_variant: Option<String>) -> Self {
        Self {
            overrides: DashMap::new(),
            default_variant,
        }
    }

    pub fn assign(&self, key: impl Into<String>, variant_id: impl Into<String>) {
        self.overrides.insert(key.into(), variant_id.into());
    }
}

impl ExperimentAssignment for StaticAssignment {
    fn variant_for(&self, key: &str, fallback: &str) -> String {
        if let Some(variant) = self.overrides.get(key) {
            return variant.clone();
        }
        self.default_variant
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}
