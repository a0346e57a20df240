//! End-to-end tree browsing tests
//!
//! Exercise the complete flow: configuration loading, engine setup, root
//! registration, and browsing the projected tree the way a desktop client
//! does on its first synchronization.

use std::fs;
use std::sync::Arc;

use drive_core::{ProjectionConfig, SyncEngine};
use drive_model::ProjectedItem;
use drive_repo::{MemoryRepository, Permissions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn engine_with(memory: &Arc<MemoryRepository>) -> SyncEngine {
    let mut engine = SyncEngine::new(&ProjectionConfig::default()).unwrap();
    engine.add_repository(memory.clone());
    engine
}

#[test]
fn test_engine_from_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("projection.toml");
    fs::write(
        &path,
        r#"
change_limit = 25

[[factory]]
name = "topLevelFolderFactory"
kind = "top-level"
order = 0

[[factory]]
name = "syncRootFolderFactory"
kind = "sync-root"
order = 10
facet = "SyncRoot"

[[factory]]
name = "defaultItemFactory"
kind = "default"
order = 50
"#,
    )
    .unwrap();

    let config = ProjectionConfig::load(&path).unwrap();
    assert_eq!(config.change_limit, 25);

    let memory = Arc::new(MemoryRepository::new("default"));
    let mut engine = SyncEngine::new(&config).unwrap();
    engine.add_repository(memory.clone());

    let top = engine.top_level_folder("alice");
    assert_eq!(top.id().as_str(), "topLevelFolderFactory/");
    assert_eq!(top.name(), "Synchronized folders");
}

#[test]
fn test_full_tree_walk() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let sub = memory.create_folder(&root.native_id, "Reports").unwrap();
    memory.create_file(&sub.native_id, "q1.txt", "q1 numbers").unwrap();
    memory.create_file(&root.native_id, "readme.txt", "hello").unwrap();

    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();

    // Top level -> the one registered root.
    let top = engine.top_level_folder("alice");
    let roots = engine.list_children("alice", top.id().as_str()).unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name(), "Workspace");

    // Root -> one folder, one file.
    let children = engine
        .list_children("alice", roots[0].id().as_str())
        .unwrap();
    assert_eq!(children.len(), 2);
    let folder = children.iter().find(|c| c.is_folder()).unwrap();
    let file = children.iter().find(|c| !c.is_folder()).unwrap();
    assert_eq!(folder.name(), "Reports");
    assert_eq!(file.name(), "readme.txt");

    // Every child hangs off the root's item id.
    for child in &children {
        assert_eq!(child.info().parent_id.as_ref(), Some(roots[0].id()));
    }

    // Leaf file carries content metadata.
    let leaves = engine.list_children("alice", folder.id().as_str()).unwrap();
    assert_eq!(leaves.len(), 1);
    let ProjectedItem::File(ref leaf) = leaves[0] else {
        panic!("expected a file item");
    };
    assert_eq!(leaf.digest_algorithm.as_deref(), Some("sha256"));
    assert!(leaf.digest.is_some());
    assert!(leaf.download_url.contains("nxbigfile/default/"));
    assert!(leaf.download_url.ends_with("/blobholder:0/q1.txt"));
}

#[test]
fn test_roots_are_per_principal() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let shared = memory.create_folder("root", "Shared").unwrap();
    let private = memory.create_folder("root", "Private").unwrap();

    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &shared.native_id).unwrap();
    engine.register_root("alice", "default", &private.native_id).unwrap();
    engine.register_root("bob", "default", &shared.native_id).unwrap();

    let alice_roots = engine.list_children("alice", "topLevelFolderFactory/").unwrap();
    let bob_roots = engine.list_children("bob", "topLevelFolderFactory/").unwrap();
    assert_eq!(alice_roots.len(), 2);
    assert_eq!(bob_roots.len(), 1);
    assert_eq!(bob_roots[0].name(), "Shared");

    // The same document resolves for bob but not for carol, who has no
    // root above it.
    let id = bob_roots[0].id().as_str();
    assert!(engine.resolve_item("bob", id).unwrap().is_some());
    assert!(engine.resolve_item("carol", id).is_err());
}

#[test]
fn test_multiple_repositories() {
    let primary = Arc::new(MemoryRepository::new("default"));
    let secondary = Arc::new(MemoryRepository::new("archive"));
    let ws1 = primary.create_folder("root", "Current").unwrap();
    let ws2 = secondary.create_folder("root", "Old").unwrap();

    let mut engine = SyncEngine::new(&ProjectionConfig::default()).unwrap();
    engine.add_repository(primary.clone());
    engine.add_repository(secondary.clone());
    engine.register_root("alice", "default", &ws1.native_id).unwrap();
    engine.register_root("alice", "archive", &ws2.native_id).unwrap();

    let roots = engine.list_children("alice", "topLevelFolderFactory/").unwrap();
    assert_eq!(roots.len(), 2);
    // Repository name is the middle id segment.
    let ids: Vec<&str> = roots.iter().map(|r| r.id().as_str()).collect();
    assert!(ids.iter().any(|id| id.contains("/archive/")));
    assert!(ids.iter().any(|id| id.contains("/default/")));
}

#[test]
fn test_sync_root_capabilities_differ_from_plain_folders() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let sub = memory.create_folder(&root.native_id, "Sub").unwrap();

    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();

    let root_item = engine
        .resolve_item("alice", &format!("syncRootFolderFactory/default/{}", root.native_id))
        .unwrap()
        .unwrap();
    let sub_item = engine
        .resolve_item("alice", &format!("defaultItemFactory/default/{}", sub.native_id))
        .unwrap()
        .unwrap();

    // A root is deletable (by unsubscribing) but never movable; an
    // ordinary folder follows its repository permissions.
    assert!(root_item.info().can_delete);
    assert!(!root_item.info().can_move);
    assert!(sub_item.info().can_move);
}

#[test]
fn test_read_only_subtree() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Published").unwrap();
    let file = memory.create_file(&root.native_id, "handbook.txt", "v1").unwrap();
    memory.set_permissions(&root.native_id, Permissions::read_only()).unwrap();
    memory.set_permissions(&file.native_id, Permissions::read_only()).unwrap();

    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();

    let root_item = engine
        .resolve_item("alice", &format!("syncRootFolderFactory/default/{}", root.native_id))
        .unwrap()
        .unwrap();
    let folder = root_item.as_folder().unwrap();
    assert!(!folder.info.can_rename);
    assert!(!folder.can_create_child);
    // Unsubscribing stays allowed on read-only roots.
    assert!(folder.info.can_delete);

    let children = engine
        .list_children("alice", root_item.id().as_str())
        .unwrap();
    let ProjectedItem::File(ref file_item) = children[0] else {
        panic!("expected a file item");
    };
    assert!(!file_item.can_update);
    assert!(!file_item.info.can_rename);
}
