//! Declarative plans: wire parsing, validation, and dependency ordering.

pub mod graph;
pub mod step;
pub mod validate;

pub use step::{
    ConditionCheck, ExecutionPlan, ExecutionStep, RawCondition, RawPlan, RawStep, StepCondition,
};
pub use validate::validate;
