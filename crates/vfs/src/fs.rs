//! Filesystem facade: the operation set consumed by the protocol dispatcher.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::SystemTime;

use tracing::{debug, trace};

use objfs_graph::{ContainerRef, Value};

use crate::error::FsError;
use crate::handle::{Handle, IdCounter};
use crate::node::{Node, NodeAttr, NodeKind};
use crate::options::ProjectionOptions;

/// Identity cache entry: pins the handle assigned to one container and keeps
/// the container alive so its identity cannot be reused.
struct IdentityEntry {
    container: ContainerRef,
    handle: Handle,
}

/// The projection facade.
///
/// Owns the handle table, the identity cache, and both identifier counters
/// for its whole lifetime. Multiple independent instances may project the
/// same graph; each has its own handle space.
///
/// The facade is single-threaded and cooperative: operations run to
/// completion without interleaving, and serialization of requests is the
/// dispatching collaborator's responsibility. If the host process mutates a
/// container while a synchronization pass is reading it, the resulting child
/// index may reflect a torn snapshot; internal bookkeeping stays consistent
/// only for operations that originate here.
pub struct FileSystem {
    /// Handle → node, for every currently resolvable node.
    nodes: HashMap<Handle, Rc<RefCell<Node>>>,
    /// Container identity → (container, handle). Containers only: leaves
    /// have no durable identity to key on.
    identities: HashMap<usize, IdentityEntry>,
    handles: IdCounter,
    file_ids: IdCounter,
    options: ProjectionOptions,
    root: Handle,
}

impl FileSystem {
    /// Project the entry at `root_owner[root_key]` as the filesystem root.
    pub fn new(root_owner: ContainerRef, root_key: impl Into<String>) -> Self {
        Self::with_options(root_owner, root_key, ProjectionOptions::default())
    }

    /// Like [`FileSystem::new`], with explicit options.
    pub fn with_options(
        root_owner: ContainerRef,
        root_key: impl Into<String>,
        options: ProjectionOptions,
    ) -> Self {
        let mut fs: FileSystem = Self {
            nodes: HashMap::new(),
            identities: HashMap::new(),
            handles: IdCounter::new(),
            file_ids: IdCounter::new(),
            options,
            root: 0,
        };
        fs.root = fs.find_or_create(&root_owner, &root_key.into());
        fs
    }

    /// The root handle.
    pub fn root(&self) -> Handle {
        self.root
    }

    /// Return the root handle for the designated mount path. Only the single
    /// export `/` is served.
    pub fn mount(&mut self, path: &str) -> Result<Handle, FsError> {
        debug!(path, "mount");
        if path == "/" {
            Ok(self.root)
        } else {
            Err(FsError::NoSuchEntry(path.to_string()))
        }
    }

    /// Resolve a handle to its current metadata, refreshing volatile fields
    /// as a side effect.
    pub fn resolve(&mut self, handle: Handle) -> Result<NodeAttr, FsError> {
        let node: Rc<RefCell<Node>> = self.live_node(handle)?;
        let attr: NodeAttr = node.borrow().attr();
        Ok(attr)
    }

    /// List a directory's entries as (name, handle) pairs, sorted by name.
    pub fn read_dir(&mut self, handle: Handle) -> Result<Vec<(String, Handle)>, FsError> {
        trace!(handle, "read_dir");
        let node: Rc<RefCell<Node>> = self.live_node(handle)?;
        let mut n = node.borrow_mut();
        if n.kind() != NodeKind::Directory {
            return Err(FsError::NotADirectory(handle));
        }
        let mut resolve = |owner: &ContainerRef, key: &str| self.find_or_create(owner, key);
        let mut entries: Vec<(String, Handle)> = n
            .children(&mut resolve)
            .iter()
            .map(|(name, &child)| (name.clone(), child))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Read up to `count` content bytes starting at `offset`.
    pub fn read(&mut self, handle: Handle, offset: u64, count: u64) -> Result<Vec<u8>, FsError> {
        trace!(handle, offset, count, "read");
        let node: Rc<RefCell<Node>> = self.live_node(handle)?;
        let mut n = node.borrow_mut();
        if n.kind() != NodeKind::File {
            return Err(FsError::NotAFile(handle));
        }
        Ok(n.read(offset, count))
    }

    /// Write `data` at `offset`, rebinding the backing value. Returns the
    /// new size.
    pub fn write(&mut self, handle: Handle, offset: u64, data: &[u8]) -> Result<u64, FsError> {
        trace!(handle, offset, len = data.len(), "write");
        let node: Rc<RefCell<Node>> = self.live_node(handle)?;
        let mut n = node.borrow_mut();
        if n.kind() != NodeKind::File {
            return Err(FsError::NotAFile(handle));
        }
        n.write(offset, data)
    }

    /// Reset a file's value to its kind's empty form.
    pub fn truncate(&mut self, handle: Handle) -> Result<(), FsError> {
        trace!(handle, "truncate");
        let node: Rc<RefCell<Node>> = self.live_node(handle)?;
        let mut n = node.borrow_mut();
        if n.kind() != NodeKind::File {
            return Err(FsError::NotAFile(handle));
        }
        n.truncate()
    }

    /// Create an entry under `parent`: a fresh empty map for
    /// [`NodeKind::Directory`], or a text value holding `initial_data` for
    /// [`NodeKind::File`].
    ///
    /// The parent's child index is refreshed before the insert so a rename
    /// settled since the last listing is not clobbered. An existing entry
    /// under `name` is replaced.
    pub fn create(
        &mut self,
        parent: Handle,
        name: &str,
        kind: NodeKind,
        initial_data: Option<&[u8]>,
    ) -> Result<(Handle, NodeAttr), FsError> {
        debug!(parent, name, ?kind, "create");
        let parent_node: Rc<RefCell<Node>> = self.live_node(parent)?;
        {
            let mut p = parent_node.borrow_mut();
            if p.kind() != NodeKind::Directory {
                return Err(FsError::NotADirectory(parent));
            }
            let mut resolve = |owner: &ContainerRef, key: &str| self.find_or_create(owner, key);
            p.refresh_children(&mut resolve);
        }

        let value: Value = match kind {
            NodeKind::Directory => Value::empty_map(),
            NodeKind::File => {
                let text: String = match initial_data {
                    Some(bytes) => String::from_utf8(bytes.to_vec()).map_err(|_| {
                        FsError::AccessDenied("initial content is not valid text".to_string())
                    })?,
                    None => String::new(),
                };
                Value::Text(text)
            }
        };

        let snapshot: ContainerRef = parent_node
            .borrow()
            .snapshot()
            .cloned()
            .ok_or(FsError::NotADirectory(parent))?;
        snapshot.insert(name.to_string(), value)?;

        let handle: Handle = self.find_or_create(&snapshot, name);
        parent_node.borrow_mut().index_child(name, handle);

        let attr: NodeAttr = self.resolve(handle)?;
        Ok((handle, attr))
    }

    /// Remove the entry `name` from `parent`, dropping its handle and any
    /// identity cache registration.
    pub fn remove(&mut self, parent: Handle, name: &str) -> Result<(), FsError> {
        debug!(parent, name, "remove");
        let parent_node: Rc<RefCell<Node>> = self.live_node(parent)?;
        let target: Handle = {
            let mut p = parent_node.borrow_mut();
            if p.kind() != NodeKind::Directory {
                return Err(FsError::NotADirectory(parent));
            }
            let mut resolve = |owner: &ContainerRef, key: &str| self.find_or_create(owner, key);
            p.children(&mut resolve).get(name).copied()
        }
        .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))?;

        let target_node: Rc<RefCell<Node>> = self.live_node(target)?;
        {
            let t = target_node.borrow();
            if t.kind() == NodeKind::Directory {
                if let Some(snapshot) = t.snapshot() {
                    if !snapshot.is_empty() {
                        return Err(FsError::NotEmpty(name.to_string()));
                    }
                }
            }
        }

        parent_node.borrow_mut().del_child(name)?;

        self.nodes.remove(&target);
        let t = target_node.borrow();
        if let Some(snapshot) = t.snapshot() {
            self.identities.remove(&snapshot.identity());
        }
        Ok(())
    }

    /// Move an entry. The moved node's handle, file id, and identity cache
    /// registration are untouched; renames never invalidate handles.
    pub fn rename(
        &mut self,
        old_parent: Handle,
        old_name: &str,
        new_parent: Handle,
        new_name: &str,
    ) -> Result<(), FsError> {
        debug!(old_parent, old_name, new_parent, new_name, "rename");
        if old_parent == new_parent && old_name == new_name {
            return Ok(());
        }

        let old_node: Rc<RefCell<Node>> = self.live_node(old_parent)?;
        let new_node: Rc<RefCell<Node>> = self.live_node(new_parent)?;
        if new_node.borrow().kind() != NodeKind::Directory {
            return Err(FsError::NotADirectory(new_parent));
        }

        let moved: Handle = {
            let mut op = old_node.borrow_mut();
            if op.kind() != NodeKind::Directory {
                return Err(FsError::NotADirectory(old_parent));
            }
            let mut resolve = |owner: &ContainerRef, key: &str| self.find_or_create(owner, key);
            op.children(&mut resolve).get(old_name).copied()
        }
        .ok_or_else(|| FsError::NoSuchEntry(old_name.to_string()))?;

        let moved_node: Rc<RefCell<Node>> = self.live_node(moved)?;
        let value: Value = moved_node
            .borrow()
            .current_value()
            .ok_or_else(|| FsError::NoSuchEntry(old_name.to_string()))?;

        // Insert the current value (not a snapshot) under the new name, then
        // retarget the moved node at the container its value now lives in.
        let new_snapshot: ContainerRef = {
            let mut np = new_node.borrow_mut();
            np.set_child(new_name, value, moved)?;
            np.snapshot()
                .cloned()
                .ok_or(FsError::NotADirectory(new_parent))?
        };
        moved_node
            .borrow_mut()
            .moved_to(new_snapshot, new_name.to_string());

        old_node.borrow_mut().del_child(old_name)?;
        Ok(())
    }

    /// Bind `name` in `parent` to the target's current value.
    ///
    /// For directory targets this is a true alias: the identity cache maps
    /// the new path to the target's existing node, and the target's link
    /// count grows. For file targets it is a copy of the current value, not
    /// a shared reference: the documented hard-link approximation.
    pub fn link(&mut self, parent: Handle, name: &str, target: Handle) -> Result<(), FsError> {
        debug!(parent, name, target, "link");
        let parent_node: Rc<RefCell<Node>> = self.live_node(parent)?;
        let target_node: Rc<RefCell<Node>> = self.live_node(target)?;

        let value: Value = target_node
            .borrow()
            .current_value()
            .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))?;
        {
            let mut p = parent_node.borrow_mut();
            if p.kind() != NodeKind::Directory {
                return Err(FsError::NotADirectory(parent));
            }
            p.set_child(name, value, target)?;
        }

        let mut t = target_node.borrow_mut();
        if t.kind() == NodeKind::Directory {
            t.bump_nlink();
        }
        Ok(())
    }

    /// Resolve `owner[key]` to a handle, creating a node if needed.
    ///
    /// Container values go through the identity cache so every access path
    /// reaching the same container resolves to the same node and handle.
    /// Value-like entries get a fresh node per access path, by design: they
    /// have no durable identity, so equal-valued but distinct leaves are
    /// distinct files.
    pub(crate) fn find_or_create(&mut self, owner: &ContainerRef, key: &str) -> Handle {
        let view: Option<ContainerRef> = owner.get(key).and_then(|v| v.as_container());
        if let Some(view) = &view {
            if let Some(entry) = self.identities.get(&view.identity()) {
                assert!(
                    entry.container.same_object(view),
                    "identity cache entry no longer matches its container"
                );
                return entry.handle;
            }
        }

        let handle: Handle = self.handles.next();
        let node: Node = Node::new(owner.clone(), key.to_string(), handle, self.file_ids.next());
        trace!(handle, key, "created node");
        self.nodes.insert(handle, Rc::new(RefCell::new(node)));
        if let Some(view) = view {
            self.identities.insert(
                view.identity(),
                IdentityEntry {
                    container: view,
                    handle,
                },
            );
        }
        handle
    }

    /// Handle-table lookup with the per-access metadata refresh applied.
    fn live_node(&mut self, handle: Handle) -> Result<Rc<RefCell<Node>>, FsError> {
        let node: Rc<RefCell<Node>> = self
            .nodes
            .get(&handle)
            .cloned()
            .ok_or(FsError::StaleHandle(handle))?;
        {
            let mut n = node.borrow_mut();
            if self.options.track_external_changes {
                n.check_changed();
            }
            n.touch_atime(SystemTime::now());
        }
        Ok(node)
    }
}
