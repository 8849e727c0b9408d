//! Example: project a demo object graph and browse it.
//!
//! Usage:
//!   cargo run -p objfs-vfs --example browse
//!
//! Builds a small graph (a JSON document, a shared container reachable via
//! two paths, a sealed record, and an opaque leaf), mounts it, then walks
//! the tree and exercises writes and renames through the facade. With
//! RUST_LOG=debug the projection's operation log is visible.

use objfs_graph::{ContainerRef, Record, Value};
use objfs_vfs::{FileSystem, FsError, Handle, NodeAttr, NodeKind};

/// Build the demo graph and return the anchor container for the mount.
fn demo_graph() -> ContainerRef {
    let config: Value = Value::from_json_str(
        r#"{
            "service": "objfs-demo",
            "port": 8080,
            "debug": false,
            "limits": {"max_files": 1024, "max_size": 65536}
        }"#,
    )
    .expect("demo JSON is valid");

    let shared: Value = Value::map_from(vec![
        ("motd".to_string(), Value::from("projected live")),
        ("uptime".to_string(), Value::from(0i64)),
    ]);

    let root: Value = Value::map_from(vec![
        ("config".to_string(), config),
        ("state".to_string(), shared.clone()),
        ("state_alias".to_string(), shared),
        (
            "build".to_string(),
            Value::record(
                Record::new("BuildInfo")
                    .with_field("version", Value::from("0.1.0"))
                    .with_field("profile", Value::from("release"))
                    .sealed(),
            ),
        ),
        ("handler".to_string(), Value::Opaque("request_handler".to_string())),
    ]);

    let anchor: ContainerRef = Value::empty_map().as_container().expect("map is a container");
    anchor
        .insert("export".to_string(), root)
        .expect("anchor is unsealed");
    anchor
}

/// Recursively print the tree below `handle`.
fn walk(fs: &mut FileSystem, handle: Handle, name: &str, depth: usize) -> Result<(), FsError> {
    let attr: NodeAttr = fs.resolve(handle)?;
    let indent: String = "  ".repeat(depth);
    match attr.kind {
        NodeKind::Directory => {
            println!(
                "{}{}/  [handle {} fileid {} nlink {} entries {}]",
                indent, name, attr.handle, attr.file_id, attr.nlink, attr.size
            );
            for (child_name, child) in fs.read_dir(handle)? {
                walk(fs, child, &child_name, depth + 1)?;
            }
        }
        NodeKind::File => {
            let content: Vec<u8> = fs.read(handle, 0, 64)?;
            println!(
                "{}{}  [handle {} fileid {} {} bytes] {:?}",
                indent,
                name,
                attr.handle,
                attr.file_id,
                attr.size,
                String::from_utf8_lossy(&content)
            );
        }
    }
    Ok(())
}

fn handle_of(fs: &mut FileSystem, dir: Handle, name: &str) -> Result<Handle, FsError> {
    fs.read_dir(dir)?
        .into_iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, handle)| handle)
        .ok_or_else(|| FsError::NoSuchEntry(name.to_string()))
}

fn main() -> Result<(), FsError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let anchor: ContainerRef = demo_graph();
    let mut fs: FileSystem = FileSystem::new(anchor, "export");
    let root: Handle = fs.mount("/")?;

    println!("== initial tree ==");
    walk(&mut fs, root, "", 0)?;

    // The shared container resolves to one handle via both paths.
    let state: Handle = handle_of(&mut fs, root, "state")?;
    let alias: Handle = handle_of(&mut fs, root, "state_alias")?;
    println!("\nstate and state_alias share handle: {}", state == alias);

    // Writes rebind values in the backing graph, respecting their kind.
    let config: Handle = handle_of(&mut fs, root, "config")?;
    let port: Handle = handle_of(&mut fs, config, "port")?;
    fs.write(port, 0, b"9090")?;
    println!("port is now {:?}", String::from_utf8_lossy(&fs.read(port, 0, 8)?));

    let handler: Handle = handle_of(&mut fs, root, "handler")?;
    match fs.write(handler, 0, b"nope") {
        Err(FsError::AccessDenied(reason)) => println!("handler write refused: {}", reason),
        other => println!("unexpected: {:?}", other.map(|_| ())),
    }

    // Renames keep handles stable.
    let motd: Handle = handle_of(&mut fs, state, "motd")?;
    fs.rename(state, "motd", state, "greeting")?;
    let attr: NodeAttr = fs.resolve(motd)?;
    println!("renamed motd -> {} (same handle {})", attr.key, attr.handle);

    println!("\n== final tree ==");
    walk(&mut fs, root, "", 0)?;
    Ok(())
}
