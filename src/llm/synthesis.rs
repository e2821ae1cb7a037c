//! Run narration through the language model.

use async_trait::async_trait;

use crate::config::PlannerConfig;
use crate::engine::aggregate::SummarySynthesizer;
use crate::engine::outcome::StepOutcome;
use crate::engine::payload;
use crate::llm::client::ChatClient;

const SYNTHESIS_SYSTEM_PROMPT: &str = concat!(
    "You summarize the outcome of an automated multi-step run for the person who requested it.\n",
    "You receive one line per completed step. Reply with one or two plain sentences describing\n",
    "what was accomplished. No markdown.",
);

/// [`SummarySynthesizer`] backed by an OpenAI-compatible chat endpoint.
pub struct LlmSynthesizer {
    client: ChatClient,
}

impl LlmSynthesizer {
    #[must_use]
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            client: ChatClient::new(
                config.base_url.clone(),
                config.model.clone(),
                config.temperature,
                config.api_key().as_deref(),
            ),
        }
    }
}

#[async_trait]
impl SummarySynthesizer for LlmSynthesizer {
    async fn synthesize(&self, outcomes: &[StepOutcome]) -> anyhow::Result<Option<String>> {
        let rendered = render_outcomes(outcomes);
        if rendered.is_empty() {
            return Ok(None);
        }
        let summary = self
            .client
            .complete(SYNTHESIS_SYSTEM_PROMPT, &rendered)
            .await?;
        Ok(Some(summary.trim().to_string()))
    }
}

/// One line per successful step: description and result text. Failed and
/// skipped steps stay out of the narration; the deterministic fallback
/// summary reports those.
fn render_outcomes(outcomes: &[StepOutcome]) -> String {
    outcomes
        .iter()
        .filter(|outcome| outcome.success && !outcome.skipped)
        .map(|outcome| {
            let detail = outcome
                .result
                .as_ref()
                .map(payload::canonical_text)
                .unwrap_or_default();
            format!("- {}: {detail}", outcome.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
