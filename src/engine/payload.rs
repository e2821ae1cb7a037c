//! Helpers for reading opaque adapter payloads.

use serde_json::Value;

/// Best-effort canonical text of a payload: a plain string as-is, then a
/// `response` field, then a `message` field, then the whole payload
/// serialized.
#[must_use]
pub fn canonical_text(payload: &Value) -> String {
    if let Value::String(text) = payload {
        return text.clone();
    }
    for key in ["response", "message"] {
        if let Some(text) = payload.get(key).filter(|value| !value.is_null()) {
            return value_text(text);
        }
    }
    payload.to_string()
}

/// Stringify a leaf value the way a user reads it: strings without JSON
/// quoting, everything else serialized.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whether a payload explicitly marks itself unsuccessful.
#[must_use]
pub fn marks_failure(payload: &Value) -> bool {
    payload.get("success").and_then(Value::as_bool) == Some(false)
}

/// Short message carried out of a failed payload into the step error
/// field.
#[must_use]
pub fn failure_message(payload: &Value) -> String {
    for key in ["error", "message", "response"] {
        if let Some(text) = payload.get(key).filter(|value| !value.is_null()) {
            return value_text(text);
        }
    }
    "adapter reported failure".to_string()
}
