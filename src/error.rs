use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `planweave`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains (gateway and adapter calls).
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Plan shape / validation ─────────────────────────────────────────
    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Planning collaborator ───────────────────────────────────────────
    #[error("planner: {0}")]
    Planner(#[from] PlannerError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Plan-shape errors ──────────────────────────────────────────────────────

/// Rejections raised before any step executes. A plan that trips one of
/// these is never partially executed.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Zero steps after parsing. Callers treat this as "ask the user to
    /// clarify", not as a crash.
    #[error("plan contains no steps")]
    Empty,

    #[error("step {index}: missing or empty `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("step {id}: params must be a JSON object")]
    ParamsNotObject { id: String },

    #[error("duplicate step id: {id}")]
    DuplicateId { id: String },

    #[error("step {id}: condition missing `{field}`")]
    ConditionMissingField { id: String, field: &'static str },

    #[error("step {id} depends on unknown step: {dependency}")]
    UnknownDependency { id: String, dependency: String },

    #[error("dependency cycle detected: {path}")]
    Cycle { path: String },
}

// ─── Config errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Planning collaborator errors ───────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planning request failed: {0}")]
    Request(String),

    #[error("planner reply contained no JSON object")]
    MissingJson,

    #[error("planner reply JSON malformed: {0}")]
    Malformed(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
