//! Uniform enumerable view over the two container variants.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::value::Value;

/// Errors raised by container mutation.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The record's attribute table is sealed and rejects mutation.
    #[error("record '{0}' is sealed and cannot be modified")]
    SealedRecord(String),
}

/// Attribute-table container: a named record whose fields form the
/// enumerable view.
///
/// A record may be sealed, after which inserts and removals fail. Sealed
/// records are how the graph models read-only attribute tables.
#[derive(Debug, Default)]
pub struct Record {
    type_name: String,
    sealed: bool,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty, unsealed record.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            sealed: false,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Seal the record, builder style. Subsequent mutation fails with
    /// [`GraphError::SealedRecord`].
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Get the record's type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Check whether the record is sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn insert(&mut self, name: String, value: Value) -> Result<(), GraphError> {
        if self.sealed {
            return Err(GraphError::SealedRecord(self.type_name.clone()));
        }
        self.fields.insert(name, value);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Option<Value>, GraphError> {
        if self.sealed {
            return Err(GraphError::SealedRecord(self.type_name.clone()));
        }
        Ok(self.fields.remove(name))
    }
}

/// The uniform enumerable key/value view over both container variants.
///
/// A `ContainerRef` is a shared reference: cloning it, or obtaining it twice
/// from the same container value, yields views of the same underlying
/// container. [`identity`](ContainerRef::identity) exposes that sharing as a
/// comparable token.
#[derive(Clone)]
pub enum ContainerRef {
    /// View of a direct-mapping container.
    Map(Rc<RefCell<BTreeMap<String, Value>>>),
    /// View of an attribute-table container.
    Record(Rc<RefCell<Record>>),
}

impl ContainerRef {
    /// Stable runtime identity of the underlying container: the allocation
    /// address. Equal identity means the same container object.
    pub fn identity(&self) -> usize {
        match self {
            ContainerRef::Map(map) => Rc::as_ptr(map) as usize,
            ContainerRef::Record(record) => Rc::as_ptr(record) as usize,
        }
    }

    /// Check whether two views refer to the same container object.
    pub fn same_object(&self, other: &ContainerRef) -> bool {
        self.identity() == other.identity()
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        match self {
            ContainerRef::Map(map) => map.borrow().len(),
            ContainerRef::Record(record) => record.borrow().len(),
        }
    }

    /// Check whether the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the value bound to `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            ContainerRef::Map(map) => map.borrow().get(key).cloned(),
            ContainerRef::Record(record) => record.borrow().get(key),
        }
    }

    /// List the current keys.
    pub fn keys(&self) -> Vec<String> {
        match self {
            ContainerRef::Map(map) => map.borrow().keys().cloned().collect(),
            ContainerRef::Record(record) => record.borrow().fields.keys().cloned().collect(),
        }
    }

    /// List the current (key, value) pairs.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            ContainerRef::Map(map) => map
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ContainerRef::Record(record) => record
                .borrow()
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Bind `key` to `value`, replacing any existing binding.
    pub fn insert(&self, key: String, value: Value) -> Result<(), GraphError> {
        match self {
            ContainerRef::Map(map) => {
                map.borrow_mut().insert(key, value);
                Ok(())
            }
            ContainerRef::Record(record) => record.borrow_mut().insert(key, value),
        }
    }

    /// Drop the binding for `key`, returning the unbound value if present.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, GraphError> {
        match self {
            ContainerRef::Map(map) => Ok(map.borrow_mut().remove(key)),
            ContainerRef::Record(record) => record.borrow_mut().remove(key),
        }
    }
}

// Shallow: the graph may be cyclic.
impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerRef::Map(map) => write!(f, "Map(@{:p})", Rc::as_ptr(map)),
            ContainerRef::Record(record) => write!(f, "Record(@{:p})", Rc::as_ptr(record)),
        }
    }
}
