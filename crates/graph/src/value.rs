//! Value model for the backing object graph.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::container::{ContainerRef, Record};

/// Type tag for a [`Value`], used by the text codec to pick a reconstruction
/// strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Int,
    Float,
    Bool,
    Opaque,
    Map,
    Record,
}

/// One vertex of the object graph.
///
/// Leaf kinds carry their payload inline. Container kinds are held behind
/// `Rc<RefCell<..>>` so that cloning a container value aliases the same
/// underlying container: two names bound to one map see each other's
/// mutations, and the container has a stable runtime identity.
#[derive(Clone)]
pub enum Value {
    /// Text leaf.
    Text(String),
    /// Integer leaf.
    Int(i64),
    /// Floating-point leaf.
    Float(f64),
    /// Boolean leaf.
    Bool(bool),
    /// A leaf with a printable form that cannot be rebuilt from text (the
    /// analog of a function or other non-literal object). The payload is a
    /// display label.
    Opaque(String),
    /// Direct-mapping container.
    Map(Rc<RefCell<BTreeMap<String, Value>>>),
    /// Attribute-table container.
    Record(Rc<RefCell<Record>>),
}

impl Value {
    /// Create an empty map container.
    pub fn empty_map() -> Value {
        Value::Map(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// Create a map container from an iterator of entries.
    pub fn map_from<I>(entries: I) -> Value
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Value::Map(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Create a record container.
    pub fn record(record: Record) -> Value {
        Value::Record(Rc::new(RefCell::new(record)))
    }

    /// Get the type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Opaque(_) => ValueKind::Opaque,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
        }
    }

    /// Capability check: return the enumerable key/value view if this value
    /// is a container, `None` for leaves.
    ///
    /// This is the single probe the projection layer uses to classify
    /// entries; it is an interface test over the two container variants, not
    /// type inspection of the payload.
    pub fn as_container(&self) -> Option<ContainerRef> {
        match self {
            Value::Map(map) => Some(ContainerRef::Map(map.clone())),
            Value::Record(record) => Some(ContainerRef::Record(record.clone())),
            _ => None,
        }
    }

    /// Stringify this value for use as file content.
    ///
    /// Containers have a printable form too: a value may change shape
    /// underneath a projection that classified it as a file, and
    /// stringification must stay total.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Opaque(label) => format!("<{}>", label),
            Value::Map(map) => match map.try_borrow() {
                Ok(entries) => format!("<map ({} entries)>", entries.len()),
                Err(_) => "<map>".to_string(),
            },
            Value::Record(record) => match record.try_borrow() {
                Ok(r) => format!("<record {} ({} fields)>", r.type_name(), r.len()),
                Err(_) => "<record>".to_string(),
            },
        }
    }
}

// The graph may be cyclic, so container debug output is shallow.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Opaque(label) => f.debug_tuple("Opaque").field(label).finish(),
            Value::Map(map) => write!(f, "Map(@{:p})", Rc::as_ptr(map)),
            Value::Record(record) => write!(f, "Record(@{:p})", Rc::as_ptr(record)),
        }
    }
}

/// Leaves compare structurally; containers compare by identity (two maps are
/// equal only if they are the same map).
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(3i64).kind(), ValueKind::Int);
        assert_eq!(Value::from(1.5f64).kind(), ValueKind::Float);
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Opaque("fn".to_string()).kind(), ValueKind::Opaque);
        assert_eq!(Value::empty_map().kind(), ValueKind::Map);
        assert_eq!(Value::record(Record::new("Point")).kind(), ValueKind::Record);
    }

    #[test]
    fn test_only_containers_have_views() {
        assert!(Value::empty_map().as_container().is_some());
        assert!(Value::record(Record::new("Point")).as_container().is_some());
        assert!(Value::from("x").as_container().is_none());
        assert!(Value::from(3i64).as_container().is_none());
        assert!(Value::Opaque("fn".to_string()).as_container().is_none());
    }

    #[test]
    fn test_clone_aliases_containers() {
        let map: Value = Value::empty_map();
        let alias: Value = map.clone();

        let view: ContainerRef = map.as_container().unwrap();
        view.insert("k".to_string(), Value::from(1i64)).unwrap();

        let alias_view: ContainerRef = alias.as_container().unwrap();
        assert_eq!(alias_view.len(), 1);
        assert!(view.same_object(&alias_view));
    }

    #[test]
    fn test_to_text_forms() {
        assert_eq!(Value::from("hello").to_text(), "hello");
        assert_eq!(Value::from(42i64).to_text(), "42");
        assert_eq!(Value::from(2.5f64).to_text(), "2.5");
        assert_eq!(Value::from(false).to_text(), "false");
        assert_eq!(Value::Opaque("builtin".to_string()).to_text(), "<builtin>");
    }

    #[test]
    fn test_equality_leaves_structural_containers_by_identity() {
        assert_eq!(Value::from(1i64), Value::from(1i64));
        assert_ne!(Value::from(1i64), Value::from(2i64));
        assert_ne!(Value::from("1"), Value::from(1i64));

        let a: Value = Value::empty_map();
        let b: Value = Value::empty_map();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
