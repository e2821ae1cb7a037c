//! Condition evaluation over prior step results.

use std::collections::HashMap;

use serde_json::Value;

use crate::engine::payload;
use crate::plan::step::{ConditionCheck, StepCondition};

/// Policy for condition checks this engine does not recognise: permit the
/// step to run. This is deliberately inconsistent with the fail-closed
/// handling of missing step references and is pinned by tests; flipping
/// the policy is a one-line change here.
pub(crate) const UNKNOWN_CHECK_PERMITS_EXECUTION: bool = true;

/// Evaluate `condition` against the payloads of previously attempted
/// steps.
///
/// Fail-closed: a reference to a step with no recorded payload (skipped,
/// hard-failed, or nonexistent) evaluates false regardless of the check.
#[must_use]
pub fn evaluate(condition: &StepCondition, prior: &HashMap<String, Value>) -> bool {
    let Some(payload) = prior.get(&condition.step) else {
        tracing::debug!(
            referenced_step = condition.step.as_str(),
            "condition references a step without a recorded result; evaluating false"
        );
        return false;
    };

    let expected = condition
        .value
        .as_ref()
        .map(payload::value_text)
        .unwrap_or_default();

    match &condition.check {
        ConditionCheck::Contains => contains(&extracted(condition, payload), &expected),
        ConditionCheck::NotContains => !contains(&extracted(condition, payload), &expected),
        ConditionCheck::Equals => equals(&extracted(condition, payload), &expected),
        ConditionCheck::NotEquals => !equals(&extracted(condition, payload), &expected),
        ConditionCheck::Truthy => !payload::marks_failure(payload),
        ConditionCheck::Falsy => payload::marks_failure(payload),
        ConditionCheck::Unknown(name) => {
            tracing::warn!(
                check = name.as_str(),
                referenced_step = condition.step.as_str(),
                "unrecognised condition check; permitting execution"
            );
            UNKNOWN_CHECK_PERMITS_EXECUTION
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn equals(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Text the string checks compare against: the selected sub-field, or the
/// payload's canonical text when no field is named.
fn extracted(condition: &StepCondition, payload: &Value) -> String {
    match &condition.field {
        Some(field) => payload
            .get(field)
            .filter(|value| !value.is_null())
            .map(payload::value_text)
            .unwrap_or_default(),
        None => payload::canonical_text(payload),
    }
}
