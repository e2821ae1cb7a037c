//! Retry exhaustion, logical failures, and skip propagation.

use planweave::engine::SkipReason;
use planweave::{EngineConfig, PlanEngine, RawPlan};
use serde_json::{Value, json};

use crate::adapters::{FailingAdapter, ScriptedAdapter, registry};

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 2;
    config
}

fn plan(value: Value) -> RawPlan {
    serde_json::from_value(value).expect("test plan should deserialize")
}

#[tokio::test]
async fn throwing_adapter_is_invoked_exactly_three_times() {
    let catalog = FailingAdapter::new("catalog", "upstream unavailable");
    let engine = PlanEngine::new(registry(vec![catalog.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [{ "id": "a", "tool": "search", "params": { "query": "rice" } }]
        })))
        .await
        .expect("plan should validate");

    assert!(!report.success);
    assert_eq!(catalog.calls(), 3);

    let a = &report.outcomes[0];
    assert_eq!(a.attempts, 3);
    assert_eq!(a.error.as_deref(), Some("upstream unavailable"));
    assert!(a.result.is_none());
}

#[tokio::test]
async fn logical_failure_keeps_the_payload_and_does_not_retry() {
    let billing = ScriptedAdapter::new(
        "billing",
        json!({ "success": false, "error": "card declined" }),
    );
    let engine = PlanEngine::new(registry(vec![billing.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [{
                "id": "pay",
                "tool": "payment_register",
                "params": { "customerId": "c-9", "amount": 1280 }
            }]
        })))
        .await
        .expect("plan should validate");

    assert!(!report.success);
    assert_eq!(billing.calls(), 1);

    let pay = &report.outcomes[0];
    assert!(!pay.success);
    assert_eq!(pay.attempts, 1);
    assert_eq!(pay.error.as_deref(), Some("card declined"));
    assert_eq!(
        pay.result,
        Some(json!({ "success": false, "error": "card declined" }))
    );
    assert!(report.final_output.is_none());
}

#[tokio::test]
async fn unknown_tool_fails_fast_and_dependents_skip() {
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "hi" }));
    let engine = PlanEngine::new(registry(vec![assistant.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "teleport", "params": {} },
                { "id": "b", "tool": "chat", "params": { "message": "after" }, "dependsOn": ["a"] }
            ]
        })))
        .await
        .expect("unknown tools pass validation");

    assert!(!report.success);

    let a = &report.outcomes[0];
    assert_eq!(a.attempts, 0);
    assert_eq!(a.error.as_deref(), Some("unknown tool: teleport"));

    let b = &report.outcomes[1];
    assert!(b.skipped);
    assert_eq!(b.error.as_deref(), Some("dependency not met: a"));
    assert_eq!(assistant.calls(), 0);
}

#[tokio::test]
async fn unmet_dependency_lists_every_missing_id() {
    let catalog = FailingAdapter::new("catalog", "search down");
    let billing = FailingAdapter::new("billing", "billing down");
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "hi" }));
    let engine = PlanEngine::new(
        registry(vec![catalog, billing, assistant.clone()]),
        &fast_config(),
    );

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": { "query": "rice" } },
                { "id": "b", "tool": "payment_register", "params": { "customerId": "c-1", "amount": 10 } },
                { "id": "c", "tool": "chat", "params": { "message": "done" }, "dependsOn": ["a", "b"] }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(!report.success);
    let c = &report.outcomes[2];
    assert!(c.skipped);
    assert_eq!(c.error.as_deref(), Some("dependency not met: a, b"));
    assert_eq!(
        c.skip_reason,
        Some(SkipReason::UnmetDependency {
            missing: vec!["a".into(), "b".into()]
        })
    );
    assert_eq!(assistant.calls(), 0);
}

#[tokio::test]
async fn skips_cascade_through_the_whole_graph() {
    let catalog = FailingAdapter::new("catalog", "search down");
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "hi" }));
    let engine = PlanEngine::new(registry(vec![catalog, assistant.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": { "query": "rice" } },
                { "id": "b", "tool": "chat", "params": { "message": "1" }, "dependsOn": ["a"] },
                { "id": "c", "tool": "chat", "params": { "message": "2" }, "dependsOn": ["b"] },
                { "id": "d", "tool": "chat", "params": { "message": "3" }, "dependsOn": ["c"] }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(!report.success);
    for (outcome, parent) in report.outcomes[1..].iter().zip(["a", "b", "c"]) {
        assert!(outcome.skipped);
        assert_eq!(
            outcome.error.as_deref(),
            Some(format!("dependency not met: {parent}").as_str())
        );
    }
    assert_eq!(assistant.calls(), 0);
}

#[tokio::test]
async fn condition_fails_closed_when_the_referenced_step_was_skipped() {
    let catalog = FailingAdapter::new("catalog", "search down");
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "hi" }));
    let mailer = ScriptedAdapter::new("mailer", json!({ "success": true, "sent": true }));
    let engine = PlanEngine::new(
        registry(vec![catalog, assistant.clone(), mailer.clone()]),
        &fast_config(),
    );

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "z", "tool": "search", "params": { "query": "rice" } },
                { "id": "a", "tool": "chat", "params": { "message": "report" }, "dependsOn": ["z"] },
                {
                    "id": "b",
                    "tool": "email_send",
                    "params": { "recipientEmail": "x@y.z", "subject": "s", "body": "t" },
                    "condition": { "step": "a", "check": "truthy" }
                }
            ]
        })))
        .await
        .expect("plan should validate");

    let b = &report.outcomes[2];
    assert!(b.skipped);
    assert!(b.success);
    assert_eq!(b.skip_reason, Some(SkipReason::ConditionFalse));
    assert_eq!(mailer.calls(), 0);
    assert_eq!(assistant.calls(), 0);
}

#[tokio::test]
async fn invalid_plans_never_execute() {
    let engine = PlanEngine::new(registry(vec![]), &fast_config());

    let err = engine
        .run(plan(json!({ "steps": [] })))
        .await
        .expect_err("empty plan");
    assert_eq!(err.to_string(), "plan: plan contains no steps");

    let err = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": {}, "dependsOn": ["b"] },
                { "id": "b", "tool": "chat", "params": {}, "dependsOn": ["a"] }
            ]
        })))
        .await
        .expect_err("cyclic plan");
    assert_eq!(err.to_string(), "plan: dependency cycle detected: a -> b -> a");

    let err = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": {} },
                { "id": "a", "tool": "chat", "params": {} }
            ]
        })))
        .await
        .expect_err("duplicate ids");
    assert_eq!(err.to_string(), "plan: duplicate step id: a");
}

#[tokio::test]
async fn failed_runs_summarize_generically() {
    let catalog = FailingAdapter::new("catalog", "search down");
    let engine = PlanEngine::new(registry(vec![catalog]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [{ "id": "a", "tool": "search", "params": { "query": "rice" } }]
        })))
        .await
        .expect("plan should validate");

    assert!(!report.success);
    assert_eq!(
        report.user_summary(),
        "I couldn't complete your request. Please try again."
    );
}
