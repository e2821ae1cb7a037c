//! Single-step execution against the tool gateway, with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{ToolBinding, ToolGateway};
use crate::engine::payload;
use crate::plan::step::ExecutionStep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Retry schedule for transient adapter failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per step, first try included. Clamped to at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A schedule with no delay between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the attempt following `attempt` (1-based): base delay
    /// doubled per failure, capped at the maximum.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// What came back from handing one step to its adapter.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Last payload the adapter produced, kept even for logical failures.
    pub payload: Option<Value>,
    pub success: bool,
    pub error: Option<String>,
    /// Adapter calls actually made; zero for steps refused up front.
    pub attempts: u32,
}

/// Runs individual steps through the gateway.
pub struct StepExecutor {
    gateway: Arc<dyn ToolGateway>,
    retry: RetryPolicy,
    step_timeout: Option<Duration>,
}

impl StepExecutor {
    #[must_use]
    pub fn new(gateway: Arc<dyn ToolGateway>) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::default(),
            step_timeout: None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Execute one step, retrying thrown adapter errors with backoff.
    ///
    /// Three outcomes end the loop early: a successful payload, a payload
    /// carrying `success: false` (the adapter answered, so retrying would
    /// repeat a completed call), and cancellation during a backoff wait.
    /// A step naming a tool outside the known set fails before any call.
    pub async fn execute(
        &self,
        step: &ExecutionStep,
        params: Value,
        cancel: &CancellationToken,
    ) -> Invocation {
        let Some(tool_kind) = step.tool_kind else {
            tracing::error!(step_id = %step.id, tool = %step.tool, "step names an unknown tool");
            return Invocation {
                payload: None,
                success: false,
                error: Some(format!("unknown tool: {}", step.tool)),
                attempts: 0,
            };
        };

        let binding = tool_kind.binding();
        let params = binding.translate_params(&params);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.invoke_once(&binding, params.clone()).await {
                Ok(payload) if payload::marks_failure(&payload) => {
                    let message = payload::failure_message(&payload);
                    tracing::warn!(
                        step_id = %step.id,
                        tool = %step.tool,
                        attempt,
                        error = %message,
                        "adapter reported failure"
                    );
                    return Invocation {
                        payload: Some(payload),
                        success: false,
                        error: Some(message),
                        attempts: attempt,
                    };
                }
                Ok(payload) => {
                    tracing::debug!(step_id = %step.id, tool = %step.tool, attempt, "step completed");
                    return Invocation {
                        payload: Some(payload),
                        success: true,
                        error: None,
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    last_error = format!("{error:#}");
                    tracing::warn!(
                        step_id = %step.id,
                        tool = %step.tool,
                        attempt,
                        error = %last_error,
                        "adapter call failed"
                    );
                    if attempt < max_attempts {
                        tokio::select! {
                            () = cancel.cancelled() => {
                                return Invocation {
                                    payload: None,
                                    success: false,
                                    error: Some(format!("cancelled during retry: {last_error}")),
                                    attempts: attempt,
                                };
                            }
                            () = tokio::time::sleep(self.retry.backoff(attempt)) => {}
                        }
                    }
                }
            }
        }

        tracing::error!(
            step_id = %step.id,
            tool = %step.tool,
            attempts = max_attempts,
            error = %last_error,
            "step failed after all attempts"
        );
        Invocation {
            payload: None,
            success: false,
            error: Some(last_error),
            attempts: max_attempts,
        }
    }

    async fn invoke_once(&self, binding: &ToolBinding, params: Value) -> Result<Value> {
        let call = self.gateway.invoke(binding.server, binding.operation, params);
        match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => anyhow::bail!("adapter call timed out after {}ms", limit.as_millis()),
            },
            None => call.await,
        }
    }
}
