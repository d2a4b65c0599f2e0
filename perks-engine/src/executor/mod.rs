//! Plan Executor
//!
//! Applies a [`ReconciliationPlan`] through the cart store in a fixed order:
//! removals, additions, attribute upserts, discount codes. Every step is
//! filtered against the latest cart snapshot first, so re-applying a plan is
//! a no-op. Failed calls are retried a bounded number of times, then logged and
//! recorded; a failed step never aborts the remaining steps. Adding lines is
//! not idempotent, so before an add is resent the cart is re-read and lines
//! that already landed are dropped from the retry.

use crate::services::CartStore;
use crate::utils::logger::AUDIT_TARGET;
use serde::{Deserialize, Serialize};
use shared::cart::{CartAttributes, CartLineInput, CartMutation, CartSnapshot, CartUserError};
use shared::error::{AppError, AppResult};
use shared::plan::ReconciliationPlan;
use std::sync::Arc;
use std::time::Duration;

/// Step of plan application, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStep {
    RemoveLines,
    AddLines,
    UpdateAttributes,
    UpdateDiscountCodes,
}

impl ExecutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoveLines => "remove_lines",
            Self::AddLines => "add_lines",
            Self::UpdateAttributes => "update_attributes",
            Self::UpdateDiscountCodes => "update_discount_codes",
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// Mutation sent and accepted
    Applied { attempts: u32 },
    /// Nothing left to do against the latest snapshot
    Skipped { reason: String },
    /// Gave up after retries
    Failed { reason: String, attempts: u32 },
}

impl StepResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepResult::Applied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepResult::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: ExecutionStep,
    #[serde(flatten)]
    pub result: StepResult,
}

/// What happened while applying a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub steps: Vec<StepOutcome>,
    /// User errors the cart store attached to accepted mutations
    pub user_errors: Vec<CartUserError>,
    /// Latest known cart state after execution
    pub cart: CartSnapshot,
}

impl ExecutionReport {
    pub fn applied_count(&self) -> usize {
        self.steps.iter().filter(|s| s.result.is_applied()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.result.is_failed())
    }

    /// No failed steps and no store-reported user errors
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none() && self.user_errors.is_empty()
    }
}

/// Retry policy for cart mutations
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Attempts after the first one
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// A single cart store call
#[derive(Clone, Copy)]
enum Mutation<'a> {
    RemoveLines(&'a [String]),
    AddLines(&'a [CartLineInput]),
    UpdateAttributes(&'a CartAttributes),
    UpdateDiscountCodes(&'a [String]),
}

impl Mutation<'_> {
    fn step(&self) -> ExecutionStep {
        match self {
            Mutation::RemoveLines(_) => ExecutionStep::RemoveLines,
            Mutation::AddLines(_) => ExecutionStep::AddLines,
            Mutation::UpdateAttributes(_) => ExecutionStep::UpdateAttributes,
            Mutation::UpdateDiscountCodes(_) => ExecutionStep::UpdateDiscountCodes,
        }
    }
}

pub struct PlanExecutor {
    store: Arc<dyn CartStore>,
    settings: ExecutorSettings,
}

impl PlanExecutor {
    pub fn new(store: Arc<dyn CartStore>, settings: ExecutorSettings) -> Self {
        Self { store, settings }
    }

    /// Apply a plan starting from the snapshot it was computed on
    pub async fn apply(&self, plan: &ReconciliationPlan, snapshot: CartSnapshot) -> ExecutionReport {
        let mut report = ExecutionReport {
            steps: Vec::with_capacity(4),
            user_errors: Vec::new(),
            cart: snapshot,
        };

        // 1. Removals: only lines still present
        let removals: Vec<String> = plan
            .lines_to_remove
            .iter()
            .filter(|id| report.cart.line(id).is_some())
            .cloned()
            .collect();
        self.run_step(&mut report, Mutation::RemoveLines(&removals), removals.is_empty())
            .await;

        // 2. Additions: only handles without a free line in the live cart
        if !plan.lines_to_add.is_empty() {
            match self.store.get(&report.cart.id).await {
                Ok(live) => report.cart = live,
                Err(e) => {
                    tracing::warn!(cart_id = %report.cart.id, error = %e, "Cart refresh failed, using snapshot");
                }
            }
        }
        let mut additions: Vec<CartLineInput> = Vec::new();
        let mut added_handles: Vec<&str> = Vec::new();
        for add in &plan.lines_to_add {
            if report.cart.has_free_line_for(&add.handle) || added_handles.contains(&add.handle.as_str())
            {
                continue;
            }
            added_handles.push(&add.handle);
            additions.push(add.to_line_input());
        }
        self.run_step(&mut report, Mutation::AddLines(&additions), additions.is_empty())
            .await;

        // 3. Attributes: merged set, only when something differs
        let pending: Vec<_> = plan
            .attribute_updates
            .iter()
            .filter(|u| report.cart.attributes.differs(u))
            .collect();
        let mut attributes = report.cart.attributes.clone();
        for update in &pending {
            attributes.apply(update);
        }
        self.run_step(
            &mut report,
            Mutation::UpdateAttributes(&attributes),
            pending.is_empty(),
        )
        .await;

        // 4. Discount codes: recomputed from the current list
        let current = report.cart.discount_code_list();
        let codes = merge_discount_codes(
            &current,
            &plan.discount_codes_to_add,
            &plan.discount_codes_to_remove,
        );
        let unchanged = codes == current;
        self.run_step(&mut report, Mutation::UpdateDiscountCodes(&codes), unchanged)
            .await;

        if !report.is_clean() {
            tracing::warn!(
                cart_id = %report.cart.id,
                failed = report.failures().count(),
                user_errors = report.user_errors.len(),
                "Plan applied with problems"
            );
        }
        report
    }

    async fn run_step(&self, report: &mut ExecutionReport, mutation: Mutation<'_>, nothing_to_do: bool) {
        let step = mutation.step();
        if nothing_to_do {
            report.steps.push(StepOutcome {
                step,
                result: StepResult::Skipped {
                    reason: "already in target state".to_string(),
                },
            });
            return;
        }

        let cart_id = report.cart.id.clone();
        let (result, outcome) = self.send_with_retry(&cart_id, &mutation).await;

        let result = match outcome {
            Ok(mutation_result) => {
                for warning in &mutation_result.warnings {
                    tracing::warn!(%cart_id, step = step.as_str(), code = %warning.code, "{}", warning.message);
                }
                for error in &mutation_result.user_errors {
                    tracing::warn!(%cart_id, step = step.as_str(), field = ?error.field, "{}", error.message);
                }
                tracing::info!(
                    target: AUDIT_TARGET,
                    cart_id = %cart_id,
                    action = step.as_str(),
                    "Cart mutation applied"
                );
                report.user_errors.extend(mutation_result.user_errors);
                report.cart = mutation_result.cart;
                result
            }
            Err(e) => {
                tracing::error!(%cart_id, step = step.as_str(), code = %e.code, error = %e, "Cart mutation failed");
                result
            }
        };
        report.steps.push(StepOutcome { step, result });
    }

    /// Send a mutation, retrying retryable failures
    async fn send_with_retry(
        &self,
        cart_id: &str,
        mutation: &Mutation<'_>,
    ) -> (StepResult, AppResult<CartMutation>) {
        let max_attempts = self.settings.retry_attempts + 1;
        let mut attempt = 0;
        // Lines still missing after a failed add, once the cart was re-read
        let mut pending: Option<Vec<CartLineInput>> = None;

        loop {
            attempt += 1;
            let current = match &pending {
                Some(lines) => Mutation::AddLines(lines),
                None => *mutation,
            };
            match self.send(cart_id, &current).await {
                Ok(result) => return (StepResult::Applied { attempts: attempt }, Ok(result)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        %cart_id,
                        step = mutation.step().as_str(),
                        attempt,
                        error = %e,
                        "Cart mutation failed, retrying"
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;

                    let Mutation::AddLines(lines) = current else {
                        continue;
                    };
                    match self.missing_lines(cart_id, lines).await {
                        Ok(MissingLines::Landed(live)) => {
                            tracing::info!(%cart_id, attempt, "Lines landed despite the error, not resending");
                            return (
                                StepResult::Applied { attempts: attempt },
                                Ok(CartMutation::ok(live)),
                            );
                        }
                        Ok(MissingLines::Missing(missing)) => pending = Some(missing),
                        Err(refresh) => {
                            // Resending blind could duplicate lines; the next pass repairs
                            tracing::warn!(%cart_id, error = %refresh, "Cart refresh failed, not resending lines");
                            let failed = StepResult::Failed {
                                reason: e.to_string(),
                                attempts: attempt,
                            };
                            return (failed, Err(e));
                        }
                    }
                }
                Err(e) => {
                    let failed = StepResult::Failed {
                        reason: e.to_string(),
                        attempts: attempt,
                    };
                    return (failed, Err(e));
                }
            }
        }
    }

    /// Re-read the cart and keep the free lines whose handle is still absent
    async fn missing_lines(&self, cart_id: &str, lines: &[CartLineInput]) -> AppResult<MissingLines> {
        let live = self.store.get(cart_id).await?;
        let missing: Vec<CartLineInput> = lines
            .iter()
            .filter(|line| !free_line_present(&live, line))
            .cloned()
            .collect();
        Ok(if missing.is_empty() {
            MissingLines::Landed(live)
        } else {
            MissingLines::Missing(missing)
        })
    }

    async fn send(&self, cart_id: &str, mutation: &Mutation<'_>) -> Result<CartMutation, AppError> {
        match mutation {
            Mutation::RemoveLines(ids) => self.store.remove_lines(cart_id, ids).await,
            Mutation::AddLines(lines) => self.store.add_lines(cart_id, lines).await,
            Mutation::UpdateAttributes(attributes) => {
                self.store.update_attributes(cart_id, attributes).await
            }
            Mutation::UpdateDiscountCodes(codes) => {
                self.store.update_discount_codes(cart_id, codes).await
            }
        }
    }
}

enum MissingLines {
    /// Everything landed, with the cart that shows it
    Landed(CartSnapshot),
    Missing(Vec<CartLineInput>),
}

fn free_line_present(cart: &CartSnapshot, line: &CartLineInput) -> bool {
    line.attributes.is_free()
        && line
            .attributes
            .free_item_type
            .as_deref()
            .is_some_and(|handle| cart.has_free_line_for(handle))
}

/// Apply code additions and removals to a code list, case-insensitively
///
/// Existing order is kept, additions go to the end, codes the plan does not
/// mention are never touched.
pub fn merge_discount_codes(current: &[String], add: &[String], remove: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = current
        .iter()
        .filter(|c| !remove.iter().any(|r| r.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();
    for code in add {
        if !codes.iter().any(|c| c.eq_ignore_ascii_case(code)) {
            codes.push(code.clone());
        }
    }
    codes
}
