//! Field values and their identities
//!
//! Rows expose their fields as `serde_json::Value`. A parent-link field may
//! hold the parent's key directly or an entity-like object carrying it; in
//! the latter case the object is compared by its identity field, never
//! structurally.

use serde_json::Value;
use std::cmp::Ordering;

use super::identity::LocalId;

/// Identity of a field value, if it has one
pub fn identity_of(value: &Value, entity_id_field: &str) -> Option<LocalId> {
    match value {
        Value::Number(n) => n.as_i64().map(LocalId::Int),
        Value::String(s) => Some(LocalId::Text(s.clone())),
        Value::Object(map) => map
            .get(entity_id_field)
            .and_then(|inner| identity_of(inner, entity_id_field)),
        _ => None,
    }
}

/// Truthiness of a has-children flag
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over field values used for sorting
///
/// Nulls first, then booleans, numbers, strings; arrays compare
/// element-wise and objects by their identity under `entity_id_field`.
pub fn compare_values(a: &Value, b: &Value, entity_id_field: &str) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right, entity_id_field);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => {
            identity_of(a, entity_id_field).cmp(&identity_of(b, entity_id_field))
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
