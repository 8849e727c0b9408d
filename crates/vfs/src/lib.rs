//! Projection of a live, mutable object graph as a hierarchical filesystem.
//!
//! This crate maps an `objfs-graph` value graph into filesystem terms for a
//! remote file-access protocol: containers become directories, leaves become
//! files whose content is the stringified value, and clients address
//! everything through stable handles.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: wire protocol + RPC dispatch (external collaborator)
//! Layer 2: FileSystem facade (mount, resolve, create, remove, rename, ...)
//! Layer 1: primitives (Node, identity cache, id counters)
//! ```
//!
//! The hard part is reconciling three mismatched models: the graph's
//! identity model (containers are reference-shared, leaves are value-like
//! with no stable identity), the filesystem's need for stable handles and
//! POSIX-ish metadata, and a request/response protocol with no connection
//! state. The identity cache guarantees that every access path reaching the
//! same container resolves to the same handle; leaves deliberately get a
//! fresh handle per path. Writes to (mostly immutable) leaf values are
//! realized by rebuilding a replacement value from text and rebinding it in
//! the owning container.
//!
//! # Example
//!
//! ```
//! use objfs_graph::Value;
//! use objfs_vfs::{FileSystem, NodeKind};
//!
//! let anchor = Value::empty_map().as_container().unwrap();
//! anchor.insert("export".to_string(), Value::empty_map()).unwrap();
//!
//! let mut fs = FileSystem::new(anchor, "export");
//! let root = fs.mount("/").unwrap();
//! let (file, _) = fs.create(root, "greeting", NodeKind::File, Some(b"hello")).unwrap();
//! assert_eq!(fs.read(file, 0, 5).unwrap(), b"hello");
//! ```
//!
//! # Limitations
//!
//! The projection is best-effort, not linearizable: it performs no locking
//! and does not defend against the host process mutating a container in the
//! middle of a synchronization pass. Handles are not persistent across
//! process restarts, only collision-resistant. Hard links to files are
//! approximated as copies.

pub mod error;
pub mod fs;
pub mod handle;
pub mod node;
pub mod options;

pub use error::FsError;
pub use fs::FileSystem;
pub use handle::{FileId, Handle, IdCounter};
pub use node::{NodeAttr, NodeKind};
pub use options::ProjectionOptions;
