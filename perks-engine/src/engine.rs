//! Engine facade
//!
//! One reconciliation pass: fetch the cart, compute the subtotal, evaluate the
//! variant's milestones, group bundles, plan, execute. Nothing is cached
//! between passes; every decision is re-derived from the cart store.

use crate::bundles::{group_lines, is_any_bundle_complete};
use crate::core::{Config, PerksConfig};
use crate::executor::{ExecutionReport, ExecutorSettings, PlanExecutor};
use crate::milestones::{VariantCatalog, evaluate};
use crate::money::reconciliation_subtotal;
use crate::planner::{self, PlannerSettings};
use crate::resolver::FreeItemResolver;
use crate::services::{CartStore, Catalog};
use serde::{Deserialize, Serialize};
use shared::cart::{CartAttributeUpdate, CartSnapshot};
use shared::error::AppResult;
use shared::models::{BundleGrouping, BundleRules};
use shared::perks::CartPerksState;
use shared::plan::ReconciliationPlan;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Engine knobs taken from [`Config`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub catalog_timeout: Duration,
    pub executor: ExecutorSettings,
    /// Plan without mutating the cart
    pub dry_run: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog_timeout: config.catalog_timeout(),
            executor: ExecutorSettings {
                retry_attempts: config.mutation_retry_attempts,
                retry_delay: config.mutation_retry_delay(),
            },
            dry_run: config.dry_run,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            catalog_timeout: Duration::from_millis(3000),
            executor: ExecutorSettings::default(),
            dry_run: false,
        }
    }
}

/// View models for rendering the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub perks: CartPerksState,
    pub bundles: BundleGrouping,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Perks and bundles of the cart after execution
    pub perks: CartPerksState,
    pub bundles: BundleGrouping,
    /// Plan computed from the fetched snapshot
    pub plan: ReconciliationPlan,
    /// `None` when the plan was empty or this is a dry run
    pub report: Option<ExecutionReport>,
}

pub struct PerksEngine {
    store: Arc<dyn CartStore>,
    resolver: FreeItemResolver,
    executor: PlanExecutor,
    variants: VariantCatalog,
    bundle_rules: BundleRules,
    planner: PlannerSettings,
    dry_run: bool,
}

impl PerksEngine {
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
        perks: PerksConfig,
        settings: EngineSettings,
    ) -> Self {
        let planner = PlannerSettings {
            bundle_discount_code: perks.bundles.discount_code.clone(),
        };
        Self {
            resolver: FreeItemResolver::new(catalog, perks.selector_option, settings.catalog_timeout),
            executor: PlanExecutor::new(store.clone(), settings.executor),
            store,
            variants: VariantCatalog::new(perks.variants),
            bundle_rules: perks.bundles,
            planner,
            dry_run: settings.dry_run,
        }
    }

    pub fn from_config(
        config: &Config,
        perks: PerksConfig,
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self::new(store, catalog, perks, EngineSettings::from_config(config))
    }

    pub fn variants(&self) -> &VariantCatalog {
        &self.variants
    }

    /// Derive view models from a snapshot, without I/O
    pub fn view(&self, snapshot: &CartSnapshot, variant_id: Option<&str>) -> CartView {
        let variant = self.variants.resolve(variant_id);
        let subtotal = reconciliation_subtotal(&snapshot.lines);
        CartView {
            perks: evaluate(subtotal, variant),
            bundles: group_lines(&snapshot.lines, &self.bundle_rules),
        }
    }

    /// Fetch the cart and bring it into a consistent state
    ///
    /// Only a failed cart fetch is an error. Everything after it degrades:
    /// unresolvable free items are skipped, failed mutations are reported.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn reconcile(&self, cart_id: &str, variant_id: Option<&str>) -> AppResult<ReconcileOutcome> {
        let snapshot = self.store.get(cart_id).await.inspect_err(|e| {
            tracing::warn!(code = %e.code, error = %e, "Cart fetch failed, skipping reconciliation");
        })?;
        Ok(self.reconcile_snapshot(snapshot, variant_id).await)
    }

    /// Reconcile from an already fetched snapshot
    pub async fn reconcile_snapshot(
        &self,
        snapshot: CartSnapshot,
        variant_id: Option<&str>,
    ) -> ReconcileOutcome {
        let view = self.view(&snapshot, variant_id);
        let bundle_complete = is_any_bundle_complete(&view.bundles.groups);

        let plan = planner::plan(
            &view.perks,
            bundle_complete,
            &snapshot,
            &self.resolver,
            &self.planner,
        )
        .await;

        if plan.is_empty() {
            tracing::debug!(cart_id = %snapshot.id, "Cart already consistent");
            return ReconcileOutcome {
                perks: view.perks,
                bundles: view.bundles,
                plan,
                report: None,
            };
        }

        if self.dry_run {
            tracing::info!(
                cart_id = %snapshot.id,
                actions = plan.action_count(),
                "Dry run, plan not applied"
            );
            return ReconcileOutcome {
                perks: view.perks,
                bundles: view.bundles,
                plan,
                report: None,
            };
        }

        let report = self.executor.apply(&plan, snapshot).await;
        tracing::info!(
            cart_id = %report.cart.id,
            variant = %view.perks.variant_id,
            subtotal = %view.perks.subtotal,
            applied = report.applied_count(),
            "Cart reconciled"
        );

        let after = self.view(&report.cart, variant_id);
        ReconcileOutcome {
            perks: after.perks,
            bundles: after.bundles,
            plan,
            report: Some(report),
        }
    }

    /// Remove lines on the shopper's behalf, then reconcile
    ///
    /// Free lines among `line_ids` are recorded as declined first so the
    /// following pass does not put them straight back. Failing to record them
    /// is logged; only a failed fetch or removal is returned.
    #[instrument(skip(self, line_ids), fields(lines = line_ids.len()))]
    pub async fn remove_lines_by_user(
        &self,
        cart_id: &str,
        line_ids: &[String],
        variant_id: Option<&str>,
    ) -> AppResult<ReconcileOutcome> {
        let mut cart = self.store.get(cart_id).await?;

        let declined: BTreeSet<String> = line_ids
            .iter()
            .filter_map(|id| cart.line(id))
            .filter_map(|line| line.free_item_handle())
            .map(str::to_string)
            .collect();

        if !declined.is_empty() {
            let mut handles = cart.attributes.declined_free_items.clone();
            handles.extend(declined);
            let update = CartAttributeUpdate::DeclinedFreeItems(handles);
            if cart.attributes.differs(&update) {
                let mut attributes = cart.attributes.clone();
                attributes.apply(&update);
                match self.store.update_attributes(cart_id, &attributes).await {
                    Ok(result) => {
                        cart = result.cart;
                        tracing::info!(
                            declined = ?cart.attributes.declined_free_items,
                            "Free items declined by shopper"
                        );
                    }
                    // The removal still goes ahead; the gift may come back on a later pass
                    Err(e) => {
                        tracing::warn!(%cart_id, code = %e.code, error = %e, "Failed to record declined free items");
                    }
                }
            }
        }

        let present: Vec<String> = line_ids
            .iter()
            .filter(|id| cart.line(id).is_some())
            .cloned()
            .collect();
        if !present.is_empty() {
            let result = self.store.remove_lines(cart_id, &present).await?;
            for error in &result.user_errors {
                tracing::warn!(field = ?error.field, "{}", error.message);
            }
            cart = result.cart;
        }

        Ok(self.reconcile_snapshot(cart, variant_id).await)
    }
}
