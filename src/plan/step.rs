//! Plan data model: the wire shapes the planning collaborator produces and
//! the normalized forms the engine executes.

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};

use crate::dispatch::ToolKind;

// ─── Wire shapes ────────────────────────────────────────────────────────────

/// A plan as it arrives from the planning collaborator.
///
/// Every field is optional or defaulted so that malformed steps surface as
/// validation failures carrying a step index instead of serde errors, and
/// unknown extra fields are accepted without complaint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlan {
    #[serde(default)]
    pub steps: Vec<RawStep>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStep {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub condition: Option<RawCondition>,
    #[serde(default)]
    pub output_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCondition {
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub check: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub field: Option<String>,
}

// ─── Normalized plan ────────────────────────────────────────────────────────

/// Predicate kind applied to a previously-produced step result.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ConditionCheck {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    Truthy,
    Falsy,
    /// Catch-all for check names this engine does not recognise. The
    /// evaluator's unknown-check policy decides what these mean.
    #[strum(default, to_string = "{0}")]
    Unknown(String),
}

/// A normalized condition gating one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCondition {
    /// Id of the step whose result this predicate inspects.
    pub step: String,
    pub check: ConditionCheck,
    pub value: Option<Value>,
    /// Optional sub-field of the referenced result; absent means the
    /// result's canonical text.
    pub field: Option<String>,
}

/// One unit of work in a validated plan.
#[derive(Debug, Clone)]
pub struct ExecutionStep {
    pub id: String,
    /// Symbolic tool name exactly as the plan wrote it, kept for reports.
    pub tool: String,
    /// Parsed tool; `None` when the name is outside the known tool set.
    pub tool_kind: Option<ToolKind>,
    pub params: Value,
    pub description: String,
    pub depends_on: Vec<String>,
    pub condition: Option<StepCondition>,
    pub output_key: Option<String>,
}

/// A validated plan plus the total order execution will follow.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub steps: Vec<ExecutionStep>,
    pub summary: Option<String>,
    /// Step ids in dependency order, fixed by the resolver at validation
    /// time.
    pub execution_order: Vec<String>,
}

impl ExecutionPlan {
    #[must_use]
    pub fn step(&self, id: &str) -> Option<&ExecutionStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
