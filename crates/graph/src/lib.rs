//! Live, mutable, reference-counted object graph for the objfs projection.
//!
//! This crate is the "backing store" side of objfs: a dynamic value graph
//! whose containers are genuinely shared (cloning a container value aliases
//! the same underlying container) and whose leaves are plain values with no
//! durable identity. The projection crate (`objfs-vfs`) maps this graph into
//! filesystem terms.
//!
//! # Value model
//!
//! - Leaf kinds: [`Value::Text`], [`Value::Int`], [`Value::Float`],
//!   [`Value::Bool`], and [`Value::Opaque`] (printable but not
//!   reconstructable from text).
//! - Container kinds: [`Value::Map`] (a direct mapping) and
//!   [`Value::Record`] (an attribute table). Both expose the same
//!   enumerable key/value view through [`ContainerRef`].
//!
//! The graph is single-threaded by design: containers are `Rc<RefCell<..>>`,
//! matching the cooperative model of the projection layer that consumes it.

pub mod codec;
pub mod container;
pub mod json;
pub mod value;

pub use container::{ContainerRef, GraphError, Record};
pub use value::{Value, ValueKind};
