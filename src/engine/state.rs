//! Per-execution shared state.

use std::collections::HashMap;

use serde_json::Value;

/// Keyed store through which one step's output becomes another step's
/// input.
///
/// One instance exists per in-flight plan execution: created empty when
/// the run starts, dropped with the run. Publishing an existing key
/// overwrites it; later steps refine earlier values.
#[derive(Debug, Default)]
pub struct SharedState {
    values: HashMap<String, Value>,
}

impl SharedState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.values.contains_key(&key) {
            tracing::debug!(key = key.as_str(), "shared state key overwritten");
        }
        self.values.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
