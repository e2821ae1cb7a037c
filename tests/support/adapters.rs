//! Scripted adapters for driving the engine through its public API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use planweave::dispatch::{AdapterRegistry, ServerAdapter};
use serde_json::Value;

/// Adapter that answers every call with a fixed payload and records what
/// it was asked.
pub struct ScriptedAdapter {
    name: &'static str,
    reply: Value,
    calls: AtomicU32,
    seen: Mutex<Vec<(String, Value)>>,
}

impl ScriptedAdapter {
    pub fn new(name: &'static str, reply: Value) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<Value> {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|(_, params)| params.clone())
    }
}

#[async_trait]
impl ServerAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn call(&self, operation: &str, params: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((operation.to_string(), params));
        Ok(self.reply.clone())
    }
}

/// Adapter that answers from a front-to-back script; the last reply
/// repeats once the script is exhausted.
pub struct QueueAdapter {
    name: &'static str,
    replies: Mutex<Vec<Value>>,
    calls: AtomicU32,
}

impl QueueAdapter {
    pub fn new(name: &'static str, replies: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            name,
            replies: Mutex::new(replies),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerAdapter for QueueAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn call(&self, _operation: &str, _params: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };
        Ok(reply)
    }
}

/// Adapter that fails every call with the same error text.
pub struct FailingAdapter {
    name: &'static str,
    message: &'static str,
    calls: AtomicU32,
}

impl FailingAdapter {
    pub fn new(name: &'static str, message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            message,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerAdapter for FailingAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn call(&self, _operation: &str, _params: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("{}", self.message))
    }
}

pub fn registry(adapters: Vec<Arc<dyn ServerAdapter>>) -> Arc<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    Arc::new(registry)
}
