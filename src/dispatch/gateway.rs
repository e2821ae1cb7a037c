//! Gateway seam between the engine and tool adapters.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

/// Uniform invocation interface over every adapter the engine can reach.
///
/// Payloads are opaque; the engine only recognises an optional top-level
/// `success: false` marker. Errors returned here count as transient and
/// are retried by the executor.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn invoke(&self, server: &str, operation: &str, params: Value) -> Result<Value>;
}

/// One in-process adapter serving a named backend.
#[async_trait]
pub trait ServerAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, operation: &str, params: Value) -> Result<Value>;
}

/// In-process gateway routing invocations to registered adapters by server
/// name.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ServerAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its own name. Re-registering a name
    /// replaces the previous adapter.
    pub fn register(&mut self, adapter: Arc<dyn ServerAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    #[must_use]
    pub fn has_server(&self, server: &str) -> bool {
        self.adapters.contains_key(server)
    }
}

#[async_trait]
impl ToolGateway for AdapterRegistry {
    async fn invoke(&self, server: &str, operation: &str, params: Value) -> Result<Value> {
        let Some(adapter) = self.adapters.get(server) else {
            anyhow::bail!("no adapter registered for server: {server}");
        };
        adapter.call(operation, params).await
    }
}

/// Gateway that fabricates successful payloads without side effects.
///
/// Used by dry runs: every invocation succeeds and echoes back where it
/// would have been routed.
pub struct EchoGateway;

#[async_trait]
impl ToolGateway for EchoGateway {
    async fn invoke(&self, server: &str, operation: &str, params: Value) -> Result<Value> {
        Ok(json!({
            "success": true,
            "response": format!("[dry-run] {server}/{operation} {params}"),
        }))
    }
}
