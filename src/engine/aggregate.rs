//! Run-level aggregation: overall verdict, final-output selection, and the
//! summary seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::outcome::StepOutcome;
use crate::engine::payload;

/// Payload categories ranked when choosing a run's final output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    ProductList,
    MessageSent,
    ChatReply,
    Generic,
}

impl ResultKind {
    /// Categorize a payload by its shape.
    #[must_use]
    pub fn classify(payload: &Value) -> Self {
        if payload.get("products").is_some_and(Value::is_array) {
            return Self::ProductList;
        }
        if payload.get("messageId").is_some() || payload.get("sent").is_some() {
            return Self::MessageSent;
        }
        if payload.get("response").is_some_and(Value::is_string) {
            return Self::ChatReply;
        }
        Self::Generic
    }

    /// Rank for final-output selection. Higher wins; product listings are
    /// the richest thing a run can surface.
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Self::ProductList => 3,
            Self::MessageSent => 2,
            Self::ChatReply => 1,
            Self::Generic => 0,
        }
    }
}

/// A run succeeds when every step that actually executed succeeded.
/// Skipped steps are outside the verdict, whatever their skip reason.
#[must_use]
pub fn overall_success(outcomes: &[StepOutcome]) -> bool {
    outcomes
        .iter()
        .filter(|outcome| !outcome.skipped)
        .all(|outcome| outcome.success)
}

/// The single payload worth surfacing from a finished run: drawn from
/// successful steps only, ranked by [`ResultKind`], with later steps
/// winning ties.
#[must_use]
pub fn final_output(outcomes: &[StepOutcome]) -> Option<Value> {
    let mut best: Option<(ResultKind, &Value)> = None;
    for outcome in outcomes {
        if outcome.skipped || !outcome.success {
            continue;
        }
        let Some(payload) = outcome.result.as_ref() else {
            continue;
        };
        let kind = ResultKind::classify(payload);
        if best.is_none_or(|(current, _)| kind.priority() >= current.priority()) {
            best = Some((kind, payload));
        }
    }
    best.map(|(_, payload)| payload.clone())
}

/// Text for the requesting user when no synthesizer produced prose.
///
/// A failed run gets a generic retry message rather than internals. A
/// successful run surfaces what its steps produced, with a note naming
/// any skips and why.
#[must_use]
pub fn fallback_summary(outcomes: &[StepOutcome], success: bool) -> String {
    if !success {
        return "I couldn't complete your request. Please try again.".to_string();
    }

    let produced: Vec<String> = outcomes
        .iter()
        .filter(|outcome| !outcome.skipped && outcome.success)
        .filter_map(|outcome| outcome.result.as_ref().map(payload::canonical_text))
        .filter(|text| !text.is_empty())
        .collect();

    let mut text = if produced.is_empty() {
        "No steps produced output.".to_string()
    } else {
        produced.join("\n")
    };

    let skipped: Vec<String> = outcomes
        .iter()
        .filter(|outcome| outcome.skipped)
        .map(|outcome| match &outcome.error {
            Some(reason) => format!("{} ({reason})", outcome.step_id),
            None => format!("{} (condition not met)", outcome.step_id),
        })
        .collect();
    if !skipped.is_empty() {
        text.push_str(&format!("\nSkipped: {}.", skipped.join(", ")));
    }
    text
}

/// Seam for turning a finished run into prose for the requesting user.
#[async_trait]
pub trait SummarySynthesizer: Send + Sync {
    /// Narrate the run, or return `None` to decline and let the caller
    /// fall back to the deterministic summary.
    async fn synthesize(&self, outcomes: &[StepOutcome]) -> anyhow::Result<Option<String>>;
}
