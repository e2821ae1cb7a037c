#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! An execution engine for declarative tool-invocation plans.
//!
//! A plan is a JSON document produced by a planning collaborator: a list
//! of steps, each naming a tool, its params, optional dependencies on
//! earlier steps, an optional condition over an earlier result, and an
//! optional key under which its own result is published. The engine
//! validates the plan, fixes a dependency order, executes it one step at
//! a time through a tool gateway, and aggregates everything into an
//! execution report.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod llm;
pub mod plan;

pub use config::EngineConfig;
pub use engine::{ExecutionReport, PlanEngine};
pub use error::{EngineError, Result};
pub use plan::{ExecutionPlan, RawPlan};
