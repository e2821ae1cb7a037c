//! `{key}` / `{key.field}` placeholder resolution against shared state.
//!
//! Only string leaves are rewritten. Placeholders whose key is not
//! published stay in the text verbatim and are reported back so the
//! caller can log them.

use serde_json::Value;

use crate::engine::payload;
use crate::engine::state::SharedState;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Placeholder { key: String, field: Option<String> },
}

/// A string leaf after placeholder substitution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedText {
    pub text: String,
    /// Placeholder keys that had no published value, in order of appearance.
    pub unresolved: Vec<String>,
}

/// Resolve every placeholder in a params tree, returning the rewritten
/// copy and the keys that stayed unresolved. The input is never mutated.
#[must_use]
pub fn resolve_params(params: &Value, state: &SharedState) -> (Value, Vec<String>) {
    let mut unresolved = Vec::new();
    let resolved = resolve_value(params, state, &mut unresolved);
    (resolved, unresolved)
}

fn resolve_value(value: &Value, state: &SharedState, unresolved: &mut Vec<String>) -> Value {
    match value {
        Value::String(text) => {
            let mut resolved = resolve_text(text, state);
            unresolved.append(&mut resolved.unresolved);
            Value::String(resolved.text)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, state, unresolved))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve_value(item, state, unresolved)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Resolve placeholders in a single string.
#[must_use]
pub fn resolve_text(text: &str, state: &SharedState) -> ResolvedText {
    let mut resolved = ResolvedText::default();
    for part in parse_template(text) {
        match part {
            TemplatePart::Literal(literal) => resolved.text.push_str(&literal),
            TemplatePart::Placeholder { key, field } => match state.get(&key) {
                Some(value) => resolved.text.push_str(&substituted(value, field.as_deref())),
                None => {
                    resolved.text.push('{');
                    resolved.text.push_str(&key);
                    if let Some(field) = &field {
                        resolved.text.push('.');
                        resolved.text.push_str(field);
                    }
                    resolved.text.push('}');
                    resolved.unresolved.push(key);
                }
            },
        }
    }
    resolved
}

/// Text substituted for a resolved placeholder. A `.field` selector reads
/// that field of the stored value, falling back to the whole value's
/// canonical text when the field is absent; a bare key uses the canonical
/// text directly.
fn substituted(value: &Value, field: Option<&str>) -> String {
    match field {
        Some(field) => value
            .get(field)
            .filter(|inner| !inner.is_null())
            .map(payload::value_text)
            .unwrap_or_else(|| payload::canonical_text(value)),
        None => payload::canonical_text(value),
    }
}

fn parse_template(text: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let (before, from_brace) = rest.split_at(open);
        literal.push_str(before);
        match placeholder_at(from_brace) {
            Some((key, field, len)) => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Placeholder { key, field });
                rest = &from_brace[len..];
            }
            None => {
                literal.push('{');
                rest = &from_brace[1..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    parts
}

/// Parse a placeholder starting at the `{` that begins `text`. Returns the
/// key, the optional field, and the byte length consumed, or `None` when
/// the braces do not form a well-formed `{key}` or `{key.field}`.
fn placeholder_at(text: &str) -> Option<(String, Option<String>, usize)> {
    let close = text.find('}')?;
    let interior = &text[1..close];
    let (key, field) = match interior.split_once('.') {
        Some((key, field)) => (key, Some(field)),
        None => (interior, None),
    };
    if !is_identifier(key) {
        return None;
    }
    if let Some(field) = field {
        if !is_identifier(field) {
            return None;
        }
    }
    Some((key.to_string(), field.map(str::to_string), close + 1))
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
