//! JSON → graph conversion.
//!
//! A convenience layer for building graphs in tests, examples, and host
//! processes. The projection layer never depends on it.

use serde_json::Value as JsonValue;

use crate::value::Value;

impl Value {
    /// Build a graph value from parsed JSON.
    ///
    /// Objects become maps, arrays become maps keyed by decimal index, and
    /// scalars become the corresponding leaf. `null` becomes an opaque leaf:
    /// it has a printable form but no text reconstruction, mirroring a
    /// non-literal host object.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Opaque("null".to_string()),
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::map_from(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), Value::from_json(item))),
            ),
            JsonValue::Object(fields) => Value::map_from(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), Value::from_json(field))),
            ),
        }
    }

    /// Parse a JSON string and build a graph value from it.
    pub fn from_json_str(json: &str) -> Result<Value, serde_json::Error> {
        Ok(Value::from_json(&serde_json::from_str(json)?))
    }
}
