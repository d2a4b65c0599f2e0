use anyhow::Context;
use perks_engine::{
    ExperimentAssignment, HttpCartStore, HttpCatalog, PerksEngine, StaticAssignment,
    setup_environment,
};
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "usage: perks-engine <cart-id> [variant]";

/// Upper bound for one cart store request
const CART_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    let config = setup_environment()?;

    let mut args = std::env::args().skip(1);
    let cart_id = args.next().context(USAGE)?;
    let variant_arg = args.next();

    // 2. Promotion config and collaborators
    let perks = config.load_perks().context("Failed to load perks config")?;
    let store = Arc::new(HttpCartStore::new(&config.cart_store_url, CART_STORE_TIMEOUT)?);
    let catalog = Arc::new(HttpCatalog::new(&config.catalog_url, config.catalog_timeout())?);
    let engine = PerksEngine::from_config(&config, perks, store, catalog);

    // 3. Variant: explicit argument, else assignment, else the default variant
    let variant_id = variant_arg.unwrap_or_else(|| {
        let assignment = StaticAssignment::new(config.default_variant.clone());
        assignment.variant_for(&cart_id, &engine.variants().default_variant().id)
    });

    tracing::info!(%cart_id, variant = %variant_id, dry_run = config.dry_run, "Reconciling cart");

    // 4. One pass; only a failed cart fetch is fatal
    let outcome = engine
        .reconcile(&cart_id, Some(&variant_id))
        .await
        .with_context(|| format!("Failed to reconcile cart {}", cart_id))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
