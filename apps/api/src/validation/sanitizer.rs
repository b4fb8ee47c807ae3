//! Response sanitizer: structural defence against partial or hallucinated JSON.
//!
//! Rules, per field shape:
//! - required text that is empty after cleaning is *removed*; absence is the
//!   "missing" marker the validator turns into a default or a `Required` failure
//! - optional arrays that are absent or null become `[]`
//! - optional nested objects left with no fields become `null`
//! - list items flagged `complete_only` are dropped unless every field survives
//! - enum values get one chance: an exact or case-insensitive trimmed match is
//!   replaced by the canonical spelling, anything else is passed through
//!   untouched so the validator rejects it
//! - dates are only trimmed, never repaired
//!
//! Output is a plain `serde_json::Value` so `sanitize` can be applied twice;
//! `sanitize(sanitize(x)) == sanitize(x)`.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::validation::hints::{FieldHint, FieldShape, SchemaHints};
use crate::validation::text::clean_text;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("expected a JSON object for {schema}, got {found}")]
    NotAnObject {
        schema: &'static str,
        found: &'static str,
    },

    #[error("all fields were empty after cleaning")]
    Empty,
}

/// Cleans `raw` against `hints`. Unknown keys are dropped.
pub fn sanitize(raw: Value, hints: &SchemaHints) -> Result<Value, SanitizeError> {
    let map = match raw {
        Value::Object(map) => map,
        other => {
            return Err(SanitizeError::NotAnObject {
                schema: hints.name,
                found: json_kind(&other),
            })
        }
    };

    let cleaned = sanitize_object(map, hints);

    let has_content = cleaned.values().any(|v| match v {
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
        _ => true,
    });
    if !has_content {
        return Err(SanitizeError::Empty);
    }

    Ok(Value::Object(cleaned))
}

/// Schema-less cleanup for intermediate data: recursively drops nulls, blank
/// strings, and arrays or objects left empty. Strings are trimmed.
pub fn sanitize_loose(raw: Value) -> Result<Map<String, Value>, SanitizeError> {
    if !raw.is_object() {
        return Err(SanitizeError::NotAnObject {
            schema: "ExtractedPayload",
            found: json_kind(&raw),
        });
    }

    match clean_loose(raw) {
        Some(Value::Object(cleaned)) => Ok(cleaned),
        _ => Err(SanitizeError::Empty),
    }
}

fn clean_loose(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.into_iter().filter_map(clean_loose).collect();
            (!cleaned.is_empty()).then_some(Value::Array(cleaned))
        }
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| clean_loose(v).map(|v| (k, v)))
                .collect();
            (!cleaned.is_empty()).then_some(Value::Object(cleaned))
        }
        other => Some(other),
    }
}

fn sanitize_object(mut map: Map<String, Value>, hints: &SchemaHints) -> Map<String, Value> {
    let mut cleaned = Map::new();

    for hint in hints.fields {
        let value = map.remove(hint.name).unwrap_or(Value::Null);
        if let Some(value) = sanitize_field(value, hint) {
            cleaned.insert(hint.name.to_string(), value);
        }
    }

    if !map.is_empty() {
        debug!(
            "Dropping {} unknown field(s) from {}: {:?}",
            map.len(),
            hints.name,
            map.keys().collect::<Vec<_>>()
        );
    }

    cleaned
}

/// Returns `None` when the field should be absent from the cleaned object.
fn sanitize_field(value: Value, hint: &FieldHint) -> Option<Value> {
    match hint.shape {
        FieldShape::Text { max_len } => sanitize_text(value, max_len),
        FieldShape::Date => sanitize_date(value),
        FieldShape::Enum { allowed } => sanitize_enum(value, allowed),
        FieldShape::TextList {
            required,
            max_len,
            dedup,
        } => match value {
            Value::Null => (!required).then(|| Value::Array(vec![])),
            Value::Array(items) => Some(Value::Array(sanitize_text_items(items, max_len, dedup))),
            other => Some(other),
        },
        FieldShape::Object { item } => match value {
            Value::Object(map) => {
                let cleaned = sanitize_object(map, item);
                Some(if cleaned.is_empty() {
                    Value::Null
                } else {
                    Value::Object(cleaned)
                })
            }
            Value::Null => Some(Value::Null),
            Value::String(s) if s.trim().is_empty() => Some(Value::Null),
            other => Some(other),
        },
        FieldShape::ObjectList {
            required,
            item,
            complete_only,
        } => match value {
            Value::Null => (!required).then(|| Value::Array(vec![])),
            Value::Array(items) => Some(Value::Array(
                items
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Value::Object(map) => {
                            let cleaned = sanitize_object(map, item);
                            let complete =
                                item.fields.iter().all(|f| cleaned.contains_key(f.name));
                            (complete || !complete_only).then_some(Value::Object(cleaned))
                        }
                        Value::Null => None,
                        Value::String(s) if s.trim().is_empty() => None,
                        other => Some(other),
                    })
                    .collect(),
            )),
            other => Some(other),
        },
    }
}

fn sanitize_text(value: Value, max_len: usize) -> Option<Value> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Wrong structural type: leave it for the validator to reject.
        other => return Some(other),
    };

    let cleaned = clean_text(&raw, max_len);
    (!cleaned.is_empty()).then_some(Value::String(cleaned))
}

fn sanitize_date(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Value::Number(n) => Some(Value::String(n.to_string())),
        other => Some(other),
    }
}

fn sanitize_enum(value: Value, allowed: &[&str]) -> Option<Value> {
    let s = match value {
        Value::String(s) => s,
        Value::Null => return None,
        other => return Some(other),
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let folded = trimmed.to_lowercase();
    let canonical = allowed
        .iter()
        .find(|candidate| **candidate == trimmed)
        .or_else(|| allowed.iter().find(|c| c.to_lowercase() == folded));

    match canonical {
        Some(candidate) => Some(Value::String((*candidate).to_string())),
        None => {
            debug!("Unrecognized enum value {trimmed:?}; expected one of {allowed:?}");
            Some(Value::String(trimmed.to_string()))
        }
    }
}

fn sanitize_text_items(items: Vec<Value>, max_len: usize, dedup: bool) -> Vec<Value> {
    let mut seen: Vec<String> = Vec::new();
    let mut cleaned = Vec::with_capacity(items.len());

    for item in items {
        let Some(value) = sanitize_text(item, max_len) else {
            continue;
        };
        if dedup {
            if let Value::String(s) = &value {
                let key = s.to_lowercase();
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);
            }
        }
        cleaned.push(value);
    }

    cleaned
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
