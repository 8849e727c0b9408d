//! Text codec: per-kind value reconstruction.
//!
//! Leaf values are often immutable, so "writing" to one means building a
//! replacement value from the new text and rebinding it in the owning
//! container. The codec is the pluggable piece of that scheme: one
//! reconstruction strategy per type tag, with unsupported kinds reporting
//! failure rather than guessing.

use crate::value::{Value, ValueKind};

impl Value {
    /// Reconstruct a value of `kind` from text.
    ///
    /// Returns `None` when the kind cannot be built from text (opaque
    /// leaves and containers) or when parsing fails. Callers map `None` to
    /// an access-denied condition.
    pub fn from_text(kind: ValueKind, text: &str) -> Option<Value> {
        match kind {
            ValueKind::Text => Some(Value::Text(text.to_string())),
            ValueKind::Int => text.trim().parse::<i64>().ok().map(Value::Int),
            ValueKind::Float => text.trim().parse::<f64>().ok().map(Value::Float),
            ValueKind::Bool => text.trim().parse::<bool>().ok().map(Value::Bool),
            ValueKind::Opaque | ValueKind::Map | ValueKind::Record => None,
        }
    }

    /// The kind's zero-argument value, used by truncate.
    ///
    /// A literal zero-length value is invalid for most kinds, so truncation
    /// is interpreted liberally as "reset to the kind's empty value".
    pub fn empty(kind: ValueKind) -> Option<Value> {
        match kind {
            ValueKind::Text => Some(Value::Text(String::new())),
            ValueKind::Int => Some(Value::Int(0)),
            ValueKind::Float => Some(Value::Float(0.0)),
            ValueKind::Bool => Some(Value::Bool(false)),
            ValueKind::Opaque | ValueKind::Map | ValueKind::Record => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_supported_kinds() {
        assert_eq!(
            Value::from_text(ValueKind::Text, "anything at all"),
            Some(Value::from("anything at all"))
        );
        assert_eq!(Value::from_text(ValueKind::Int, "42"), Some(Value::from(42i64)));
        assert_eq!(Value::from_text(ValueKind::Int, " -7 "), Some(Value::from(-7i64)));
        assert_eq!(
            Value::from_text(ValueKind::Float, "2.5"),
            Some(Value::from(2.5f64))
        );
        assert_eq!(
            Value::from_text(ValueKind::Bool, "true"),
            Some(Value::from(true))
        );
    }

    #[test]
    fn test_from_text_parse_failures() {
        assert!(Value::from_text(ValueKind::Int, "not a number").is_none());
        assert!(Value::from_text(ValueKind::Int, "1.5").is_none());
        assert!(Value::from_text(ValueKind::Float, "").is_none());
        assert!(Value::from_text(ValueKind::Bool, "yes").is_none());
    }

    #[test]
    fn test_from_text_unsupported_kinds() {
        assert!(Value::from_text(ValueKind::Opaque, "x").is_none());
        assert!(Value::from_text(ValueKind::Map, "x").is_none());
        assert!(Value::from_text(ValueKind::Record, "x").is_none());
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(Value::empty(ValueKind::Text), Some(Value::from("")));
        assert_eq!(Value::empty(ValueKind::Int), Some(Value::from(0i64)));
        assert_eq!(Value::empty(ValueKind::Float), Some(Value::from(0.0f64)));
        assert_eq!(Value::empty(ValueKind::Bool), Some(Value::from(false)));
        assert!(Value::empty(ValueKind::Opaque).is_none());
        assert!(Value::empty(ValueKind::Map).is_none());
    }
}
