//! Shared types for the storefront perks layer
//!
//! Cart wire model, promotion configuration, derived view models and the
//! unified error system. Consumed by `perks-engine` and by whatever renders
//! the cart.

pub mod cart;
pub mod error;
pub mod models;
pub mod perks;
pub mod plan;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use cart::{CartLine, CartSnapshot, LineAttributes};
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use perks::{CartPerksState, MilestoneProgress};
pub use plan::{FreeLineAdd, ReconciliationPlan};
