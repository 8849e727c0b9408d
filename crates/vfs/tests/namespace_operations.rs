//! Integration tests for namespace manipulation: create, remove, rename,
//! link, and their failure modes.

use objfs_graph::{ContainerRef, Record, Value};
use objfs_vfs::{FileSystem, FsError, Handle, NodeAttr, NodeKind};

/// Build a filesystem whose root directory holds `entries`, returning the
/// facade and a live view of the root container.
fn project(entries: Vec<(&str, Value)>) -> (FileSystem, ContainerRef) {
    let anchor: ContainerRef = Value::empty_map().as_container().unwrap();
    let root: Value = Value::map_from(entries.into_iter().map(|(k, v)| (k.to_string(), v)));
    let root_view: ContainerRef = root.as_container().unwrap();
    anchor.insert("export".to_string(), root).unwrap();
    (FileSystem::new(anchor, "export"), root_view)
}

fn handle_of(fs: &mut FileSystem, dir: Handle, name: &str) -> Handle {
    fs.read_dir(dir)
        .unwrap()
        .into_iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, handle)| handle)
        .unwrap_or_else(|| panic!("entry '{}' not found", name))
}

// =============================================================================
// CREATE
// =============================================================================

#[test]
fn test_create_directory_and_file() {
    let (mut fs, root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();

    let (dir, dir_attr) = fs.create(root, "docs", NodeKind::Directory, None).unwrap();
    assert_eq!(dir_attr.kind, NodeKind::Directory);
    assert_eq!(dir_attr.size, 0);

    let (file, file_attr) = fs
        .create(dir, "readme", NodeKind::File, Some(b"hello"))
        .unwrap();
    assert_eq!(file_attr.kind, NodeKind::File);
    assert_eq!(file_attr.size, 5);
    assert_eq!(fs.read(file, 0, 16).unwrap(), b"hello".to_vec());

    // Both live in the backing graph, not just in projection bookkeeping.
    let docs: ContainerRef = root_view.get("docs").unwrap().as_container().unwrap();
    assert_eq!(docs.get("readme"), Some(Value::from("hello")));
}

#[test]
fn test_create_without_data_makes_empty_file() {
    let (mut fs, _root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();

    let (file, attr) = fs.create(root, "empty", NodeKind::File, None).unwrap();
    assert_eq!(attr.size, 0);
    assert_eq!(fs.read(file, 0, 16).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_create_replaces_existing_entry() {
    let (mut fs, root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();

    fs.create(root, "x", NodeKind::File, Some(b"one")).unwrap();
    let (second, _) = fs.create(root, "x", NodeKind::File, Some(b"two")).unwrap();

    assert_eq!(fs.read(second, 0, 16).unwrap(), b"two".to_vec());
    assert_eq!(root_view.get("x"), Some(Value::from("two")));
}

#[test]
fn test_create_under_file_is_rejected() {
    let (mut fs, _root_view) = project(vec![("f", Value::from("leaf"))]);
    let root: Handle = fs.mount("/").unwrap();
    let file: Handle = handle_of(&mut fs, root, "f");

    let err: FsError = fs
        .create(file, "child", NodeKind::File, None)
        .unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
}

// =============================================================================
// REMOVE
// =============================================================================

#[test]
fn test_remove_missing_entry() {
    let (mut fs, _root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();
    assert!(matches!(
        fs.remove(root, "ghost"),
        Err(FsError::NoSuchEntry(_))
    ));
}

#[test]
fn test_remove_nonempty_directory_refused() {
    let (mut fs, _root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();

    let (dir, _) = fs.create(root, "d", NodeKind::Directory, None).unwrap();
    fs.create(dir, "x", NodeKind::File, Some(b"data")).unwrap();

    assert!(matches!(fs.remove(root, "d"), Err(FsError::NotEmpty(_))));

    // Emptying the directory makes the removal legal.
    fs.remove(dir, "x").unwrap();
    fs.remove(root, "d").unwrap();
    assert!(matches!(fs.resolve(dir), Err(FsError::StaleHandle(_))));
}

#[test]
fn test_removed_leaf_handle_goes_stale() {
    let (mut fs, root_view) = project(vec![("f", Value::from("bye"))]);
    let root: Handle = fs.mount("/").unwrap();
    let file: Handle = handle_of(&mut fs, root, "f");

    fs.remove(root, "f").unwrap();
    assert!(matches!(fs.resolve(file), Err(FsError::StaleHandle(_))));
    assert!(root_view.get("f").is_none());
}

#[test]
fn test_removed_directory_identity_is_purged() {
    let (mut fs, root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();

    let (dir, _) = fs.create(root, "d", NodeKind::Directory, None).unwrap();
    fs.remove(root, "d").unwrap();

    // Rebinding the same name to a fresh container mints a fresh node; the
    // old registration is gone.
    root_view.insert("d".to_string(), Value::empty_map()).unwrap();
    let fresh: Handle = handle_of(&mut fs, root, "d");
    assert_ne!(fresh, dir);
}

// =============================================================================
// RENAME
// =============================================================================

#[test]
fn test_rename_preserves_handle() {
    let (mut fs, _root_view) = project(vec![("a", Value::from("payload"))]);
    let root: Handle = fs.mount("/").unwrap();
    let original: Handle = handle_of(&mut fs, root, "a");
    let original_attr: NodeAttr = fs.resolve(original).unwrap();

    fs.rename(root, "a", root, "b").unwrap();

    let attr: NodeAttr = fs.resolve(original).unwrap();
    assert_eq!(attr.key, "b");
    assert_eq!(attr.file_id, original_attr.file_id);

    let names: Vec<String> = fs
        .read_dir(root)
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(!names.contains(&"a".to_string()));
    assert!(names.contains(&"b".to_string()));
    assert_eq!(handle_of(&mut fs, root, "b"), original);
}

#[test]
fn test_rename_across_directories() {
    let (mut fs, root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();
    let (src, _) = fs.create(root, "src", NodeKind::Directory, None).unwrap();
    let (dst, _) = fs.create(root, "dst", NodeKind::Directory, None).unwrap();
    let (file, _) = fs.create(src, "f", NodeKind::File, Some(b"moved")).unwrap();

    fs.rename(src, "f", dst, "g").unwrap();

    let attr: NodeAttr = fs.resolve(file).unwrap();
    assert_eq!(attr.key, "g");
    assert_eq!(fs.read(file, 0, 16).unwrap(), b"moved".to_vec());

    assert!(fs.read_dir(src).unwrap().is_empty());
    assert_eq!(handle_of(&mut fs, dst, "g"), file);

    // The value itself moved in the backing graph.
    let src_view: ContainerRef = root_view.get("src").unwrap().as_container().unwrap();
    let dst_view: ContainerRef = root_view.get("dst").unwrap().as_container().unwrap();
    assert!(src_view.get("f").is_none());
    assert_eq!(dst_view.get("g"), Some(Value::from("moved")));
}

#[test]
fn test_rename_keeps_directory_identity_registration() {
    let (mut fs, _root_view) = project(vec![("d", Value::empty_map())]);
    let root: Handle = fs.mount("/").unwrap();
    let dir: Handle = handle_of(&mut fs, root, "d");

    fs.rename(root, "d", root, "renamed").unwrap();
    assert_eq!(handle_of(&mut fs, root, "renamed"), dir);
}

#[test]
fn test_rename_missing_source() {
    let (mut fs, _root_view) = project(vec![]);
    let root: Handle = fs.mount("/").unwrap();
    assert!(matches!(
        fs.rename(root, "ghost", root, "elsewhere"),
        Err(FsError::NoSuchEntry(_))
    ));
}

// =============================================================================
// LINK
// =============================================================================

#[test]
fn test_link_directory_is_a_true_alias() {
    let (mut fs, _root_view) = project(vec![("d", Value::empty_map())]);
    let root: Handle = fs.mount("/").unwrap();
    let dir: Handle = handle_of(&mut fs, root, "d");

    fs.link(root, "alias", dir).unwrap();

    assert_eq!(handle_of(&mut fs, root, "alias"), dir);
    assert_eq!(fs.resolve(dir).unwrap().nlink, 2);

    // A create through one name is visible through the other.
    fs.create(dir, "inside", NodeKind::File, Some(b"x")).unwrap();
    let alias: Handle = handle_of(&mut fs, root, "alias");
    let names: Vec<String> = fs
        .read_dir(alias)
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(names.contains(&"inside".to_string()));
}

#[test]
fn test_link_file_is_a_copy() {
    let (mut fs, root_view) = project(vec![("f", Value::from("data"))]);
    let root: Handle = fs.mount("/").unwrap();
    let file: Handle = handle_of(&mut fs, root, "f");

    fs.link(root, "copy", file).unwrap();
    assert_eq!(handle_of(&mut fs, root, "copy"), file);
    assert_eq!(fs.resolve(file).unwrap().nlink, 1);

    // A write through the handle rebinds the original key only; the linked
    // name keeps the copied value. Hard links to files are approximated,
    // not shared.
    fs.write(file, 0, b"DATA").unwrap();
    assert_eq!(root_view.get("f"), Some(Value::from("DATA")));
    assert_eq!(root_view.get("copy"), Some(Value::from("data")));
}

// =============================================================================
// SEALED CONTAINERS
// =============================================================================

#[test]
fn test_sealed_record_rejects_namespace_mutation() {
    let sealed: Value = Value::record(
        Record::new("Builtins")
            .with_field("version", Value::from("1.0"))
            .sealed(),
    );
    let (mut fs, _root_view) = project(vec![("cfg", sealed)]);
    let root: Handle = fs.mount("/").unwrap();
    let cfg: Handle = handle_of(&mut fs, root, "cfg");

    // Reads work: the record projects as an ordinary directory.
    let version: Handle = handle_of(&mut fs, cfg, "version");
    assert_eq!(fs.read(version, 0, 16).unwrap(), b"1.0".to_vec());

    // Mutation is refused by the value's type.
    assert!(matches!(
        fs.create(cfg, "extra", NodeKind::File, None),
        Err(FsError::AccessDenied(_))
    ));
    assert!(matches!(
        fs.remove(cfg, "version"),
        Err(FsError::AccessDenied(_))
    ));

    // The failed removal left the cached index intact and resolvable.
    assert_eq!(handle_of(&mut fs, cfg, "version"), version);
}

#[test]
fn test_unsealed_record_projects_as_writable_directory() {
    let record: Value = Value::record(
        Record::new("Point")
            .with_field("x", Value::from(1i64))
            .with_field("y", Value::from(2i64)),
    );
    let (mut fs, _root_view) = project(vec![("point", record)]);
    let root: Handle = fs.mount("/").unwrap();
    let point: Handle = handle_of(&mut fs, root, "point");

    assert_eq!(fs.read_dir(point).unwrap().len(), 2);
    fs.create(point, "z", NodeKind::File, Some(b"3")).unwrap();
    assert_eq!(fs.read_dir(point).unwrap().len(), 3);
    fs.remove(point, "z").unwrap();
    assert_eq!(fs.read_dir(point).unwrap().len(), 2);
}

// =============================================================================
// KIND CHECKS
// =============================================================================

#[test]
fn test_operations_require_matching_kind() {
    let (mut fs, _root_view) = project(vec![("f", Value::from("leaf"))]);
    let root: Handle = fs.mount("/").unwrap();
    let file: Handle = handle_of(&mut fs, root, "f");

    assert!(matches!(fs.read(root, 0, 4), Err(FsError::NotAFile(_))));
    assert!(matches!(fs.write(root, 0, b"x"), Err(FsError::NotAFile(_))));
    assert!(matches!(fs.truncate(root), Err(FsError::NotAFile(_))));
    assert!(matches!(
        fs.read_dir(file),
        Err(FsError::NotADirectory(_))
    ));
    assert!(matches!(
        fs.remove(file, "x"),
        Err(FsError::NotADirectory(_))
    ));
}
