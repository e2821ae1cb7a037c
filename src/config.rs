//! Engine configuration: a TOML file layered over built-in defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::executor::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::error::ConfigError;

// ─── Top-level config ───────────────────────────────────────────────────────

/// Engine settings. Every field has a default, so an absent file or an
/// empty table is a complete configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryConfig,
    /// Upper bound on a single adapter call, in seconds. Unset means no
    /// limit; a call that exceeds it counts as a transient failure.
    pub step_timeout_secs: Option<u64>,
    pub synthesis: SynthesisConfig,
    pub planner: PlannerConfig,
}

impl EngineConfig {
    /// Read settings from a TOML file and validate them.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|error| ConfigError::Load(format!("{}: {error}", path.display())))?;
        let config: Self =
            toml::from_str(&contents).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.planner.temperature) {
            return Err(ConfigError::Validation(
                "planner.temperature must be between 0 and 2".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

// ─── Retry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per step, first try included (default: 3)
    pub max_attempts: u32,
    /// First backoff delay in milliseconds (default: 200)
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds (default: 5000)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

// ─── Synthesis ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Narrate finished runs through the language model (default: true)
    pub enabled: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ─── Planner ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// OpenAI-compatible endpoint base (default: `https://api.openai.com/v1`)
    pub base_url: String,
    /// Model requested for planning and synthesis (default: gpt-4o-mini)
    pub model: String,
    /// Sampling temperature, 0 to 2 (default: 0.2)
    pub temperature: f64,
    /// Environment variable holding the API key (default: `PLANWEAVE_API_KEY`)
    pub api_key_env: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            api_key_env: "PLANWEAVE_API_KEY".into(),
        }
    }
}

impl PlannerConfig {
    /// API key from the configured environment variable, when set and
    /// non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}
