//! Language-model collaborators: plan generation and run narration.

pub mod client;
pub mod planner;
pub mod synthesis;

pub use client::ChatClient;
pub use planner::{LlmPlanner, Planner, parse_plan_reply};
pub use synthesis::LlmSynthesizer;
