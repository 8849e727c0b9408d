//! Node: the projection of one (owning container, key) pair.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::{debug, warn};

use objfs_graph::{ContainerRef, Value, ValueKind};

use crate::error::FsError;
use crate::handle::{FileId, Handle};

/// Path separator. Keys whose textual form contains it cannot be represented
/// as a single directory entry and are skipped during synchronization.
pub(crate) const SEPARATOR: char = '/';

/// Whether a node projects as a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The entry's value exposes an enumerable key/value view.
    Directory,
    /// The entry's value is a leaf; content is its stringified form.
    File,
}

/// Metadata snapshot for a node, as reported to the protocol dispatcher.
#[derive(Debug, Clone)]
pub struct NodeAttr {
    /// Handle of the node. Stable for the node's lifetime, including across
    /// renames.
    pub handle: Handle,
    /// Secondary identifier, independent of handle; also rename-stable.
    pub file_id: FileId,
    /// Directory or file.
    pub kind: NodeKind,
    /// Key under which the entry currently lives in its owning container.
    pub key: String,
    /// Entry count for directories, content byte length for files.
    pub size: u64,
    /// Link count. Files always report 1: leaves have no stable identity to
    /// count bindings against.
    pub nlink: u32,
    /// Last modification observed through or by the projection.
    pub mtime: SystemTime,
    /// Last access through the projection.
    pub atime: SystemTime,
}

/// Projection of one (owning container, key) pair into filesystem terms.
///
/// `kind` is decided once, at construction, by probing the value for a
/// container view. A value that later changes shape causes protocol-level
/// inconsistency; this is a documented limitation, not handled here.
///
/// The node does not own its backing value: it holds the owning container
/// and a key, so external mutation of that container is visible on the next
/// access.
pub struct Node {
    handle: Handle,
    file_id: FileId,
    owner: ContainerRef,
    key: String,
    kind: NodeKind,
    /// Container view cached at construction (directories only). Later
    /// diffs compare this same view object's contents, not a fresh probe of
    /// `owner[key]`.
    snapshot: Option<ContainerRef>,
    /// Cached name → handle index (directories only).
    children: HashMap<String, Handle>,
    /// Last-observed stringified value, as bytes (files only).
    content: Vec<u8>,
    size: u64,
    nlink: u32,
    mtime: SystemTime,
    atime: SystemTime,
}

impl Node {
    /// Construct the projection of `owner[key]`, probing the current value
    /// to classify it.
    pub(crate) fn new(owner: ContainerRef, key: String, handle: Handle, file_id: FileId) -> Self {
        let now: SystemTime = SystemTime::now();
        let view: Option<ContainerRef> = owner.get(&key).and_then(|v| v.as_container());

        let (kind, snapshot, content) = match view {
            Some(view) => (NodeKind::Directory, Some(view), Vec::new()),
            None => (NodeKind::File, None, stringify(&owner, &key)),
        };
        let size: u64 = match kind {
            NodeKind::Directory => container_len(&snapshot),
            NodeKind::File => content.len() as u64,
        };

        Self {
            handle,
            file_id,
            owner,
            key,
            kind,
            snapshot,
            children: HashMap::new(),
            content,
            size,
            nlink: 1,
            mtime: now,
            atime: now,
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The cached container view, present iff the node is a directory.
    pub(crate) fn snapshot(&self) -> Option<&ContainerRef> {
        self.snapshot.as_ref()
    }

    /// The value currently bound to this node's key in its owning container.
    pub(crate) fn current_value(&self) -> Option<Value> {
        self.owner.get(&self.key)
    }

    /// Build the metadata snapshot reported to the dispatcher. Directory
    /// sizes are the live entry count.
    pub(crate) fn attr(&self) -> NodeAttr {
        let size: u64 = match self.kind {
            NodeKind::Directory => container_len(&self.snapshot),
            NodeKind::File => self.size,
        };
        NodeAttr {
            handle: self.handle,
            file_id: self.file_id,
            kind: self.kind,
            key: self.key.clone(),
            size,
            nlink: self.nlink,
            mtime: self.mtime,
            atime: self.atime,
        }
    }

    pub(crate) fn touch_atime(&mut self, now: SystemTime) {
        self.atime = now;
    }

    /// Record that a rename moved this entry: it now lives under `key` in
    /// `owner`. Handle and file id are untouched.
    pub(crate) fn moved_to(&mut self, owner: ContainerRef, key: String) {
        self.owner = owner;
        self.key = key;
    }

    /// Record one more projection-made name binding to this directory's
    /// container.
    pub(crate) fn bump_nlink(&mut self) {
        self.nlink = self.nlink.saturating_add(1);
    }

    // ---- file content ---------------------------------------------------

    /// Refresh content from the current value and return the requested
    /// range. Reading past the end yields the empty remainder, never an
    /// error.
    pub(crate) fn read(&mut self, offset: u64, count: u64) -> Vec<u8> {
        self.content = stringify(&self.owner, &self.key);
        let start: usize = (offset as usize).min(self.content.len());
        let end: usize = (offset.saturating_add(count) as usize).min(self.content.len());
        self.content[start..end].to_vec()
    }

    /// Splice `data` into the current text at `offset` and rebind the
    /// result, NUL-padding if `offset` is past the current end. Returns the
    /// new size.
    pub(crate) fn write(&mut self, offset: u64, data: &[u8]) -> Result<u64, FsError> {
        let old: Vec<u8> = stringify(&self.owner, &self.key);
        let offset: usize = offset as usize;

        let mut spliced: Vec<u8> = Vec::with_capacity(old.len().max(offset + data.len()));
        spliced.extend_from_slice(&old[..offset.min(old.len())]);
        spliced.resize(offset, 0);
        spliced.extend_from_slice(data);
        if old.len() > offset + data.len() {
            spliced.extend_from_slice(&old[offset + data.len()..]);
        }

        let text: String = String::from_utf8(spliced).map_err(|_| {
            FsError::AccessDenied("spliced content is not valid text".to_string())
        })?;
        self.rebind(Some(&text))?;
        Ok(self.size)
    }

    /// Reset the value to its kind's zero-argument form. A literal
    /// zero-length value is invalid for most kinds, so truncation is
    /// interpreted liberally.
    pub(crate) fn truncate(&mut self) -> Result<(), FsError> {
        self.rebind(None)
    }

    /// Rebind: build a replacement value of the current value's kind and
    /// store it back at `owner[key]`. Most leaf values are immutable, so
    /// every write is really "replace the value bound to this name".
    ///
    /// On failure the original value is left untouched; no partial rebind is
    /// ever committed.
    fn rebind(&mut self, text: Option<&str>) -> Result<(), FsError> {
        let kind: ValueKind = self
            .current_value()
            .ok_or_else(|| FsError::NoSuchEntry(self.key.clone()))?
            .kind();

        let rebuilt: Option<Value> = match text {
            Some(text) => Value::from_text(kind, text),
            None => Value::empty(kind),
        };
        let value: Value = rebuilt.ok_or_else(|| {
            FsError::AccessDenied(format!("value of kind {:?} cannot be rebuilt from text", kind))
        })?;

        self.owner.insert(self.key.clone(), value)?;
        self.content = stringify(&self.owner, &self.key);
        self.size = self.content.len() as u64;
        self.mtime = SystemTime::now();
        Ok(())
    }

    /// Called on every resolution: restringify the current value and compare
    /// against the cache, so external mutation of the backing graph surfaces
    /// as an mtime change on the next client access. Comparatively
    /// heavyweight; see `ProjectionOptions::track_external_changes`.
    pub(crate) fn check_changed(&mut self) {
        if self.kind != NodeKind::File {
            return;
        }
        let current: Vec<u8> = stringify(&self.owner, &self.key);
        if current != self.content {
            self.content = current;
            self.size = self.content.len() as u64;
            self.mtime = SystemTime::now();
        }
    }

    // ---- directory synchronization --------------------------------------

    /// Return the child index, refreshing it when the cached entry count no
    /// longer matches the live container.
    ///
    /// The count comparison is a cheap heuristic: additions and removals
    /// that cancel out between accesses are missed. That weak-consistency
    /// policy is deliberate; strengthening it would change the observable
    /// cost of every listing.
    pub(crate) fn children(
        &mut self,
        resolve: &mut dyn FnMut(&ContainerRef, &str) -> Handle,
    ) -> &HashMap<String, Handle> {
        if self.children.len() != container_len(&self.snapshot) as usize {
            self.refresh_children(resolve);
        }
        &self.children
    }

    /// Rebuild the name → handle index from the live container.
    ///
    /// Keys already present in the old index keep their handles, so
    /// unchanged entries stay stable across listings. Keys containing the
    /// path separator are skipped. Old-index entries not carried forward
    /// drop out of the listing, but their handles stay resolvable in the
    /// handle table until explicitly removed: a client that still holds one
    /// can keep using it, at the cost of a bounded leak.
    pub(crate) fn refresh_children(
        &mut self,
        resolve: &mut dyn FnMut(&ContainerRef, &str) -> Handle,
    ) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        let old: HashMap<String, Handle> = std::mem::take(&mut self.children);
        for key in snapshot.keys() {
            if key.contains(SEPARATOR) {
                debug!(key = %key, "skipping key containing path separator");
                continue;
            }
            let handle: Handle = match old.get(&key) {
                Some(&handle) => handle,
                None => resolve(&snapshot, &key),
            };
            self.children.insert(key, handle);
        }
    }

    /// Bind `name` to `value` in the live container and to `handle` in the
    /// cached index, keeping the two in lock-step.
    pub(crate) fn set_child(
        &mut self,
        name: &str,
        value: Value,
        handle: Handle,
    ) -> Result<(), FsError> {
        let snapshot: &ContainerRef = self
            .snapshot
            .as_ref()
            .ok_or(FsError::NotADirectory(self.handle))?;
        snapshot.insert(name.to_string(), value)?;
        self.children.insert(name.to_string(), handle);
        Ok(())
    }

    /// Record `name` → `handle` in the cached index only. Used when the live
    /// container was already updated through the snapshot view.
    pub(crate) fn index_child(&mut self, name: &str, handle: Handle) {
        self.children.insert(name.to_string(), handle);
    }

    /// Drop `name` from the live container first, then the cached index, so
    /// a rejected removal leaves the index pointing at a still-resolvable
    /// entry rather than a dangling one.
    pub(crate) fn del_child(&mut self, name: &str) -> Result<(), FsError> {
        let snapshot: &ContainerRef = self
            .snapshot
            .as_ref()
            .ok_or(FsError::NotADirectory(self.handle))?;
        snapshot.remove(name)?;
        self.children.remove(name);
        Ok(())
    }
}

/// Entry count of an optional container view.
fn container_len(snapshot: &Option<ContainerRef>) -> u64 {
    snapshot.as_ref().map(|s| s.len() as u64).unwrap_or(0)
}

/// Stringify the current value at `owner[key]`. A key missing from its owner
/// is tolerated: the backing graph may have been mutated underneath us, and
/// a read should degrade to empty content rather than fail.
fn stringify(owner: &ContainerRef, key: &str) -> Vec<u8> {
    match owner.get(key) {
        Some(value) => value.to_text().into_bytes(),
        None => {
            warn!(key, "key missing from owning container, treating content as empty");
            Vec::new()
        }
    }
}
