//! Perks Engine - cart perks and bundle reconciliation
//!
//! # Architecture
//!
//! Keeps a storefront cart consistent with two promotion systems:
//!
//! - **Threshold perks** (`milestones`): free shipping and free gift lines
//!   unlocked by the cart subtotal, per experiment variant
//! - **Bundles** (`bundles`): multi-item bundles tagged on line attributes,
//!   rewarded with a discount code when complete
//!
//! Each pass is a pure pipeline over the cart snapshot followed by
//! idempotent execution through the cart store.
//!
//! # Module layout
//!
//! ```text
//! perks-engine/src/
//! ├── core/         # Config, perks config, config errors
//! ├── money/        # Reconciliation subtotal, line amounts
//! ├── milestones/   # Evaluator, variant catalog
//! ├── bundles/      # Bundle grouping and completeness
//! ├── resolver/     # Free item -> purchasable variant
//! ├── planner/      # Reconciliation plan
//! ├── executor/     # Plan application with retries
//! ├── services/     # Cart store, catalog, experiment assignment
//! ├── engine.rs     # Reconciliation pass facade
//! └── utils/        # Logging
//! ```

pub mod bundles;
pub mod core;
pub mod engine;
pub mod executor;
pub mod milestones;
pub mod money;
pub mod planner;
pub mod resolver;
pub mod services;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, ConfigError, PerksConfig};
pub use engine::{CartView, EngineSettings, PerksEngine, ReconcileOutcome};
pub use executor::{ExecutionReport, PlanExecutor};
pub use resolver::FreeItemResolver;
pub use services::{
    CartStore, Catalog, ExperimentAssignment, HttpCartStore, HttpCatalog, MemoryCartStore,
    MemoryCatalog, StaticAssignment,
};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Load `.env`, read [`Config`] and initialize logging
pub fn setup_environment() -> anyhow::Result<Config> {
    // A missing .env file is normal outside development
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    tracing::debug!(
        environment = %config.environment,
        cart_store = %config.cart_store_url,
        catalog = %config.catalog_url,
        dry_run = config.dry_run,
        "Environment ready"
    );
    if config.is_production() && config.dry_run {
        tracing::warn!("DRY_RUN is set in production, carts will not be reconciled");
    }
    Ok(config)
}
