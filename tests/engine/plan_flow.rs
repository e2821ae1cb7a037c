//! End-to-end plan runs over scripted adapters.

use planweave::{EngineConfig, PlanEngine, RawPlan};
use serde_json::{Value, json};

use crate::adapters::{QueueAdapter, ScriptedAdapter, registry};

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
async fn search_result_feeds_the_email_body() {
    let catalog =
        ScriptedAdapter::new("catalog", json!({ "success": true, "response": "Rice 5kg" }));
    let mailer = ScriptedAdapter::new("mailer", json!({ "success": true, "messageId": "m-1" }));
    let engine = PlanEngine::new(registry(vec![catalog, mailer.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": { "query": "rice" }, "outputKey": "found" },
                {
                    "id": "b",
                    "tool": "email_send",
                    "params": {
                        "recipientEmail": "owner@example.com",
                        "subject": "stock check",
                        "body": "Found: {found}"
                    },
                    "dependsOn": ["a"]
                }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(report.success);
    assert_eq!(report.outcomes[1].params["body"], json!("Found: Rice 5kg"));

    let sent = mailer.last_params().expect("mailer should be called");
    assert_eq!(sent["to"], json!("owner@example.com"));
    assert_eq!(sent["text"], json!("Found: Rice 5kg"));
    assert!(sent.get("recipientEmail").is_none());
}

#[tokio::test]
async fn steps_run_in_dependency_order_regardless_of_listing() {
    let catalog = ScriptedAdapter::new("catalog", json!({ "success": true, "response": "ok" }));
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "hi" }));
    let engine = PlanEngine::new(registry(vec![catalog, assistant]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "b", "tool": "chat", "params": { "message": "after" }, "dependsOn": ["a"] },
                { "id": "a", "tool": "search", "params": { "query": "rice" } }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(report.success);
    assert_eq!(report.outcomes[0].step_id, "a");
    assert_eq!(report.outcomes[1].step_id, "b");
}

#[tokio::test]
async fn failed_condition_skips_without_invoking_the_adapter() {
    let catalog =
        ScriptedAdapter::new("catalog", json!({ "success": true, "response": "all stocked" }));
    let mailer = ScriptedAdapter::new("mailer", json!({ "success": true, "sent": true }));
    let engine = PlanEngine::new(registry(vec![catalog, mailer.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "search", "params": { "query": "stock" } },
                {
                    "id": "b",
                    "tool": "email_send",
                    "params": { "recipientEmail": "x@y.z", "subject": "alert", "body": "restock now" },
                    "dependsOn": ["a"],
                    "condition": { "step": "a", "check": "contains", "value": "urgent" }
                }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(report.success);
    let b = &report.outcomes[1];
    assert!(b.skipped);
    assert!(b.success);
    assert!(b.error.is_none());
    assert_eq!(mailer.calls(), 0);
}

#[tokio::test]
async fn final_output_prefers_product_listings() {
    let catalog = ScriptedAdapter::new(
        "catalog",
        json!({ "success": true, "products": [{ "name": "Rice 5kg", "price": 1280 }] }),
    );
    let assistant =
        ScriptedAdapter::new("assistant", json!({ "success": true, "response": "all done" }));
    let engine = PlanEngine::new(registry(vec![catalog, assistant]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "find", "tool": "search", "params": { "query": "rice" } },
                { "id": "tell", "tool": "chat", "params": { "message": "done" }, "dependsOn": ["find"] }
            ]
        })))
        .await
        .expect("plan should validate");

    let output = report.final_output.expect("run should surface an output");
    assert!(output.get("products").is_some());
}

#[tokio::test]
async fn equal_result_kinds_surface_the_later_step() {
    let assistant = QueueAdapter::new(
        "assistant",
        vec![
            json!({ "success": true, "response": "one" }),
            json!({ "success": true, "response": "two" }),
        ],
    );
    let engine = PlanEngine::new(registry(vec![assistant]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "chat", "params": { "message": "first" } },
                { "id": "b", "tool": "chat", "params": { "message": "second" }, "dependsOn": ["a"] }
            ]
        })))
        .await
        .expect("plan should validate");

    assert_eq!(
        report.final_output,
        Some(json!({ "success": true, "response": "two" }))
    );
}

#[tokio::test]
async fn duplicate_output_key_takes_the_latest_value() {
    let assistant = QueueAdapter::new(
        "assistant",
        vec![
            json!({ "success": true, "response": "first" }),
            json!({ "success": true, "response": "second" }),
        ],
    );
    let engine = PlanEngine::new(registry(vec![assistant.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "chat", "params": { "message": "1" }, "outputKey": "said" },
                { "id": "b", "tool": "chat", "params": { "message": "2" }, "dependsOn": ["a"], "outputKey": "said" },
                { "id": "c", "tool": "chat", "params": { "message": "heard: {said}" }, "dependsOn": ["b"] }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(report.success);
    assert_eq!(report.outcomes[2].params["message"], json!("heard: second"));
    assert_eq!(assistant.calls(), 3);
}

#[tokio::test]
async fn unresolved_placeholder_passes_through_verbatim() {
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "ok" }));
    let engine = PlanEngine::new(registry(vec![assistant.clone()]), &fast_config());

    let report = engine
        .run(plan(json!({
            "steps": [
                { "id": "a", "tool": "chat", "params": { "message": "hello {missing}" } }
            ]
        })))
        .await
        .expect("plan should validate");

    assert!(report.success);
    let heard = assistant.last_params().expect("assistant should be called");
    assert_eq!(heard["message"], json!("hello {missing}"));
}

#[tokio::test]
async fn each_run_starts_from_fresh_state() {
    let catalog =
        ScriptedAdapter::new("catalog", json!({ "success": true, "response": "Rice 5kg" }));
    let assistant = ScriptedAdapter::new("assistant", json!({ "success": true, "response": "ok" }));
    let engine = PlanEngine::new(registry(vec![catalog, assistant]), &fast_config());

    let steps = json!({
        "steps": [
            { "id": "a", "tool": "search", "params": { "query": "rice" }, "outputKey": "found" },
            { "id": "b", "tool": "chat", "params": { "message": "got {found}" }, "dependsOn": ["a"] }
        ]
    });

    let first = engine.run(plan(steps.clone())).await.expect("first run");
    let second = engine.run(plan(steps)).await.expect("second run");

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(
        first.outcomes[1].params["message"],
        second.outcomes[1].params["message"]
    );
    assert!(first.success && second.success);
}
