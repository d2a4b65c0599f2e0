//! Milestone evaluation and variant configuration

pub mod evaluator;
pub mod variants;

pub use evaluator::{evaluate, evaluate_milestone};
pub use variants::{VARIANT_A, VARIANT_B, VariantCatalog, builtin_variants};
