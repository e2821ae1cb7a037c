//! Plan validation: raw wire plans in, normalized executable plans out.

use std::collections::HashSet;
use std::str::FromStr;

use crate::dispatch::ToolKind;
use crate::error::PlanError;
use crate::plan::graph;
use crate::plan::step::{
    ConditionCheck, ExecutionPlan, ExecutionStep, RawCondition, RawPlan, RawStep, StepCondition,
};

/// Validate and normalize a raw plan.
///
/// Checks, in order: plan non-empty; per-step required fields (`id`,
/// `tool`, `params` object) and condition shape; id uniqueness; then
/// dependency resolution, which rejects dangling references and cycles and
/// fixes the execution order. Nothing executes when any check fails.
pub fn validate(raw: RawPlan) -> Result<ExecutionPlan, PlanError> {
    if raw.steps.is_empty() {
        return Err(PlanError::Empty);
    }

    let mut steps = Vec::with_capacity(raw.steps.len());
    for (index, raw_step) in raw.steps.into_iter().enumerate() {
        steps.push(normalize_step(index, raw_step)?);
    }

    let mut seen = HashSet::with_capacity(steps.len());
    for step in &steps {
        if !seen.insert(step.id.clone()) {
            return Err(PlanError::DuplicateId {
                id: step.id.clone(),
            });
        }
    }

    let execution_order = graph::execution_order(&steps)?;

    Ok(ExecutionPlan {
        steps,
        summary: raw.summary,
        execution_order,
    })
}

fn normalize_step(index: usize, raw: RawStep) -> Result<ExecutionStep, PlanError> {
    let id = required_text(raw.id, index, "id")?;
    let tool = required_text(raw.tool, index, "tool")?;

    let params = raw.params.ok_or(PlanError::MissingField {
        index,
        field: "params",
    })?;
    if !params.is_object() {
        return Err(PlanError::ParamsNotObject { id });
    }

    let tool_kind = ToolKind::from_str(&tool).ok();
    if tool_kind.is_none() {
        tracing::warn!(
            step_id = %id,
            tool = %tool,
            "step references a tool outside the known set"
        );
    }

    let condition = raw
        .condition
        .map(|raw_condition| normalize_condition(&id, raw_condition))
        .transpose()?;

    let description = raw
        .description
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| tool.clone());

    Ok(ExecutionStep {
        id,
        tool,
        tool_kind,
        params,
        description,
        depends_on: raw.depends_on,
        condition,
        output_key: raw.output_key.filter(|key| !key.trim().is_empty()),
    })
}

fn required_text(
    value: Option<String>,
    index: usize,
    field: &'static str,
) -> Result<String, PlanError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(PlanError::MissingField { index, field }),
    }
}

fn normalize_condition(step_id: &str, raw: RawCondition) -> Result<StepCondition, PlanError> {
    let step = raw
        .step
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PlanError::ConditionMissingField {
            id: step_id.to_string(),
            field: "step",
        })?;

    let check_text = raw
        .check
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PlanError::ConditionMissingField {
            id: step_id.to_string(),
            field: "check",
        })?;

    // Infallible: unrecognised names land in the catch-all variant.
    let check = ConditionCheck::from_str(&check_text)
        .unwrap_or(ConditionCheck::Unknown(check_text));

    Ok(StepCondition {
        step,
        check,
        value: raw.value,
        field: raw.field,
    })
}
