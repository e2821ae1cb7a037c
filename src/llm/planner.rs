//! Plan generation through the language model.

use async_trait::async_trait;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::llm::client::ChatClient;
use crate::plan::RawPlan;

const PLANNER_SYSTEM_PROMPT: &str = concat!(
    "You turn a user's request into an execution plan. Respond with a JSON object in this exact format:\n",
    "{\n",
    "  \"steps\": [\n",
    "    {\n",
    "      \"id\": \"<unique-step-id>\",\n",
    "      \"tool\": \"<tool name>\",\n",
    "      \"params\": { ... },\n",
    "      \"description\": \"<what this step does>\",\n",
    "      \"dependsOn\": [\"<ids of prerequisite steps>\"],\n",
    "      \"condition\": { \"step\": \"<id>\", \"check\": \"<check>\", \"value\": <value>, \"field\": \"<optional field>\" },\n",
    "      \"outputKey\": \"<key later steps may reference>\"\n",
    "    }\n",
    "  ],\n",
    "  \"summary\": \"<one-line plan description>\"\n",
    "}\n\n",
    "Available tools and their params:\n",
    "- search: { \"query\": \"<text>\" }\n",
    "- email_send: { \"recipientEmail\": \"<address>\", \"subject\": \"<text>\", \"body\": \"<text>\" }\n",
    "- payment_register: { \"customerId\": \"<id>\", \"amount\": <number> }\n",
    "- contact_save: { \"name\": \"<text>\", \"email\": \"<address>\", \"phone\": \"<text>\" }\n",
    "- chat: { \"message\": \"<text>\" }\n\n",
    "Condition checks: contains, not_contains, equals, not_equals, truthy, falsy.\n",
    "Any string param may embed an earlier step's result as {outputKey} or {outputKey.field}.\n",
    "dependsOn, condition, outputKey, and summary are optional.\n",
    "If the request needs no tools, respond with { \"steps\": [] }.\n",
    "Wrap the JSON in a ```json code fence.",
);

/// Produces raw plans from free-form user requests.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn build_plan(&self, request: &str) -> Result<RawPlan, PlannerError>;
}

/// [`Planner`] backed by an OpenAI-compatible chat endpoint.
pub struct LlmPlanner {
    client: ChatClient,
}

impl LlmPlanner {
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
impl Planner for LlmPlanner {
    async fn build_plan(&self, request: &str) -> Result<RawPlan, PlannerError> {
        let reply = self
            .client
            .complete(PLANNER_SYSTEM_PROMPT, request)
            .await
            .map_err(|error| PlannerError::Request(format!("{error:#}")))?;
        tracing::debug!(chars = reply.len(), "planner replied");
        parse_plan_reply(&reply)
    }
}

/// Pull the plan out of a model reply, tolerating prose and code fences
/// around the JSON.
pub fn parse_plan_reply(reply: &str) -> Result<RawPlan, PlannerError> {
    let json = extract_json(reply).ok_or(PlannerError::MissingJson)?;
    serde_json::from_str(json).map_err(|error| PlannerError::Malformed(error.to_string()))
}

fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            let candidate = rest[..end].trim();
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}
