//! Per-step execution records as they appear in the final report.

use serde::Serialize;
use serde_json::Value;

use crate::engine::executor::Invocation;
use crate::plan::step::ExecutionStep;

/// Why a step was skipped instead of executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// At least one dependency did not finish successfully.
    UnmetDependency { missing: Vec<String> },
    /// The step's condition evaluated false.
    ConditionFalse,
    /// Execution was cancelled before the step started.
    Cancelled,
}

impl SkipReason {
    /// Error text recorded alongside the skip, when the skip counts as a
    /// failure. A condition evaluating false is a normal outcome and
    /// carries none.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::UnmetDependency { missing } => {
                Some(format!("dependency not met: {}", missing.join(", ")))
            }
            Self::ConditionFalse => None,
            Self::Cancelled => Some("execution cancelled".to_string()),
        }
    }
}

/// The record of one step, executed or skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step_id: String,
    pub tool: String,
    pub description: String,
    /// Params after placeholder resolution, as sent to the adapter.
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub success: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Adapter calls made for this step; zero when it never ran.
    pub attempts: u32,
}

impl StepOutcome {
    /// Record for a step that was never handed to the executor.
    ///
    /// A condition-false skip is the plan working as written and counts as
    /// success; the other reasons mark the step failed.
    #[must_use]
    pub fn skipped(step: &ExecutionStep, params: Value, reason: SkipReason) -> Self {
        Self {
            step_id: step.id.clone(),
            tool: step.tool.clone(),
            description: step.description.clone(),
            params,
            result: None,
            success: matches!(reason, SkipReason::ConditionFalse),
            skipped: true,
            error: reason.message(),
            skip_reason: Some(reason),
            attempts: 0,
        }
    }

    /// Record for a step the executor ran (or refused for an unknown tool).
    #[must_use]
    pub fn executed(step: &ExecutionStep, params: Value, invocation: Invocation) -> Self {
        Self {
            step_id: step.id.clone(),
            tool: step.tool.clone(),
            description: step.description.clone(),
            params,
            result: invocation.payload,
            success: invocation.success,
            skipped: false,
            skip_reason: None,
            error: invocation.error,
            attempts: invocation.attempts,
        }
    }
}
