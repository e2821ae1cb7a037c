//! The execution engine: drives a validated plan step by step through the
//! tool gateway, threading results, conditions, and skips between steps.
//!
//! Every run gets fresh state. The engine owns sequencing and skip
//! propagation; per-step retry and timeout live in [`executor`], payload
//! interpretation in [`payload`], and report aggregation in [`aggregate`].

pub mod aggregate;
pub mod condition;
pub mod executor;
pub mod outcome;
pub mod payload;
pub mod state;
pub mod template;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dispatch::ToolGateway;
use crate::error::Result;
use crate::plan::{self, ExecutionPlan, ExecutionStep, RawPlan};

pub use aggregate::{ResultKind, SummarySynthesizer};
pub use executor::{Invocation, RetryPolicy, StepExecutor};
pub use outcome::{SkipReason, StepOutcome};
pub use state::SharedState;

// ─── Report ─────────────────────────────────────────────────────────────────

/// The full record of one plan run, serializable for callers and logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub run_id: Uuid,
    /// True when every step that actually executed succeeded.
    pub success: bool,
    /// One row per plan step, in execution order.
    pub outcomes: Vec<StepOutcome>,
    /// The payload most worth surfacing, when any successful step
    /// produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<Value>,
    /// Synthesized narrative of the run, when a synthesizer produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionReport {
    /// Prose for the requesting user: the synthesized summary when
    /// present, otherwise a deterministic count line.
    #[must_use]
    pub fn user_summary(&self) -> String {
        match &self.summary {
            Some(summary) => summary.clone(),
            None => aggregate::fallback_summary(&self.outcomes, self.success),
        }
    }
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Validates plans and executes them sequentially against a gateway.
pub struct PlanEngine {
    executor: StepExecutor,
    synthesizer: Option<Arc<dyn SummarySynthesizer>>,
}

impl PlanEngine {
    #[must_use]
    pub fn new(gateway: Arc<dyn ToolGateway>, config: &EngineConfig) -> Self {
        Self {
            executor: StepExecutor::new(gateway)
                .with_retry(config.retry_policy())
                .with_step_timeout(config.step_timeout()),
            synthesizer: None,
        }
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SummarySynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Validate a raw plan and execute it.
    pub async fn run(&self, plan: RawPlan) -> Result<ExecutionReport> {
        let plan = plan::validate(plan)?;
        Ok(self.execute(&plan).await)
    }

    /// Execute an already-validated plan to completion.
    pub async fn execute(&self, plan: &ExecutionPlan) -> ExecutionReport {
        self.execute_with_cancellation(plan, &CancellationToken::new())
            .await
    }

    /// Execute a validated plan, honouring `cancel` between steps and
    /// between retry attempts. Outcomes recorded before cancellation are
    /// kept; remaining steps are marked cancelled, and the report still
    /// covers every step.
    pub async fn execute_with_cancellation(
        &self,
        plan: &ExecutionPlan,
        cancel: &CancellationToken,
    ) -> ExecutionReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, steps = plan.len(), "plan execution started");

        let mut run = RunState::default();
        for id in &plan.execution_order {
            // The resolver only emits ids of validated steps.
            let Some(step) = plan.step(id) else { continue };
            let outcome = self.run_step(step, &run, cancel).await;
            run.absorb(step, outcome);
        }

        let success = aggregate::overall_success(&run.outcomes);
        let final_output = aggregate::final_output(&run.outcomes);
        let summary = self.synthesize(&run.outcomes).await;
        tracing::info!(%run_id, success, "plan execution finished");

        ExecutionReport {
            run_id,
            success,
            outcomes: run.outcomes,
            final_output,
            summary,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn run_step(
        &self,
        step: &ExecutionStep,
        run: &RunState,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        if cancel.is_cancelled() {
            tracing::info!(step_id = %step.id, "skipping step: execution cancelled");
            return StepOutcome::skipped(step, step.params.clone(), SkipReason::Cancelled);
        }

        let missing = run.unmet_dependencies(step);
        if !missing.is_empty() {
            tracing::info!(step_id = %step.id, missing = ?missing, "skipping step: dependencies not met");
            return StepOutcome::skipped(
                step,
                step.params.clone(),
                SkipReason::UnmetDependency { missing },
            );
        }

        if let Some(cond) = &step.condition {
            if !condition::evaluate(cond, &run.payloads) {
                tracing::info!(
                    step_id = %step.id,
                    referenced_step = %cond.step,
                    check = %cond.check,
                    "skipping step: condition false"
                );
                return StepOutcome::skipped(step, step.params.clone(), SkipReason::ConditionFalse);
            }
        }

        let (params, unresolved) = template::resolve_params(&step.params, &run.shared);
        if !unresolved.is_empty() {
            tracing::warn!(
                step_id = %step.id,
                keys = ?unresolved,
                "params reference unpublished result keys"
            );
        }

        let invocation = self.executor.execute(step, params.clone(), cancel).await;
        StepOutcome::executed(step, params, invocation)
    }

    async fn synthesize(&self, outcomes: &[StepOutcome]) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(outcomes).await {
            Ok(summary) => summary,
            Err(error) => {
                tracing::warn!(error = format!("{error:#}"), "summary synthesis failed");
                None
            }
        }
    }
}

// ─── Per-run state ──────────────────────────────────────────────────────────

/// State accumulated over one run. Built fresh per execution; nothing
/// survives into the next run.
#[derive(Default)]
struct RunState {
    shared: SharedState,
    /// Last payload per step id, for condition evaluation. Only steps
    /// whose adapter produced a payload appear here.
    payloads: HashMap<String, Value>,
    /// Ids of steps that executed and succeeded. Skipped steps never
    /// qualify, whatever their recorded success flag.
    succeeded: HashSet<String>,
    outcomes: Vec<StepOutcome>,
}

impl RunState {
    fn unmet_dependencies(&self, step: &ExecutionStep) -> Vec<String> {
        step.depends_on
            .iter()
            .filter(|dependency| !self.succeeded.contains(dependency.as_str()))
            .cloned()
            .collect()
    }

    fn absorb(&mut self, step: &ExecutionStep, outcome: StepOutcome) {
        if let Some(payload) = &outcome.result {
            self.payloads.insert(step.id.clone(), payload.clone());
        }
        if outcome.success && !outcome.skipped {
            self.succeeded.insert(step.id.clone());
            if let Some(key) = &step.output_key {
                self.shared
                    .publish(key.clone(), outcome.result.clone().unwrap_or(Value::Null));
            }
        }
        self.outcomes.push(outcome);
    }
}
