//! Change-feed scenario tests
//!
//! Drive the engine through the poll cycles a synchronization client runs:
//! register roots, mutate documents, poll, and check the reported deltas
//! and checkpoints.

use std::sync::Arc;

use drive_core::{Checkpoint, ProjectionConfig, RecordOrigin, SyncEngine};
use drive_repo::{EventKind, MemoryRepository};
use pretty_assertions::assert_eq;

fn engine_with(memory: &Arc<MemoryRepository>) -> SyncEngine {
    let mut engine = SyncEngine::new(&ProjectionConfig::default()).unwrap();
    engine.add_repository(memory.clone());
    engine
}

/// Register a root and consume the initial poll, returning a clean
/// checkpoint to mutate against.
fn settled(engine: &SyncEngine, principal: &str) -> Checkpoint {
    engine
        .get_change_summary(principal, &Checkpoint::initial())
        .unwrap()
        .checkpoint
}

#[test]
fn test_quiet_poll_is_empty_and_advances_checkpoint() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert!(summary.changes.is_empty());
    assert!(!summary.too_many_changes);
    assert!(summary.checkpoint.timestamp >= checkpoint.timestamp);
    assert_eq!(
        summary.checkpoint.root_definitions,
        checkpoint.root_definitions
    );
}

#[test]
fn test_edit_lifecycle_across_polls() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let mut checkpoint = settled(&engine, "alice");

    // Create.
    let file = memory.create_file(&root.native_id, "a.txt", "v1").unwrap();
    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    assert_eq!(summary.changes[0].event_kind, EventKind::Created);
    assert_eq!(summary.changes[0].item.as_ref().unwrap().name(), "a.txt");
    checkpoint = summary.checkpoint;

    // Modify: the resolved item carries the new digest.
    memory.update_content(&file.native_id, "v2").unwrap();
    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    assert_eq!(summary.changes[0].event_kind, EventKind::Modified);
    checkpoint = summary.checkpoint;

    // Trash: reported as a deletion, no item attached.
    memory.follow_transition(&file.native_id, "delete").unwrap();
    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    assert_eq!(summary.changes[0].event_kind, EventKind::Deleted);
    assert!(summary.changes[0].item.is_none());
    checkpoint = summary.checkpoint;

    // Restore: a lifecycle transition with the item back.
    memory.follow_transition(&file.native_id, "undelete").unwrap();
    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    assert_eq!(
        summary.changes[0].event_kind,
        EventKind::LifecycleTransition
    );
    assert!(summary.changes[0].item.is_some());

    // Nothing reported twice.
    let summary = engine
        .get_change_summary("alice", &summary.checkpoint)
        .unwrap();
    assert!(summary.changes.is_empty());
}

#[test]
fn test_move_within_root_resolves_new_parent() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let sub = memory.create_folder(&root.native_id, "Sub").unwrap();
    let file = memory.create_file(&root.native_id, "a.txt", "v1").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    memory.move_document(&file.native_id, &sub.native_id).unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    let record = &summary.changes[0];
    assert_eq!(record.event_kind, EventKind::Moved);
    let item = record.item.as_ref().unwrap();
    assert_eq!(
        item.info().parent_id.as_ref().map(|id| id.as_str()),
        Some(format!("defaultItemFactory/default/{}", sub.native_id).as_str())
    );
}

#[test]
fn test_document_leaving_scope_degrades_to_deletion() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let outside = memory.create_folder("root", "Elsewhere").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    // The creation happens inside the root, so its audit row is in scope,
    // but by poll time the document lives outside every root.
    let file = memory.create_file(&root.native_id, "a.txt", "v1").unwrap();
    memory.move_document(&file.native_id, &outside.native_id).unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    let record = summary
        .changes
        .iter()
        .find(|r| r.event_kind == EventKind::Deleted)
        .expect("creation row should degrade to a deletion");
    assert!(record.item.is_none());
    assert_eq!(
        record.item_id.as_ref().map(|id| id.as_str()),
        Some(format!("defaultItemFactory/default/{}", file.native_id).as_str())
    );
}

#[test]
fn test_registration_mid_window_surfaces_root_diff_first() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    let checkpoint = settled(&engine, "alice");

    engine.register_root("alice", "default", &root.native_id).unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert!(!summary.changes.is_empty());
    // The synthesized record is stamped at poll time and sorts ahead of
    // the subscription's own audit entry.
    assert_eq!(summary.changes[0].origin, RecordOrigin::RootDiff);
    assert_eq!(summary.changes[0].event_kind, EventKind::Modified);
    assert!(summary.changes[0].item.is_some());
    assert!(
        summary
            .changes
            .iter()
            .skip(1)
            .all(|r| r.origin == RecordOrigin::Audit)
    );
}

#[test]
fn test_reregistration_after_unregister_is_reported_again() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    engine.unregister_root("alice", "default", &root.native_id).unwrap();
    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    assert_eq!(summary.changes[0].event_kind, EventKind::Deleted);

    engine.register_root("alice", "default", &root.native_id).unwrap();
    let summary = engine
        .get_change_summary("alice", &summary.checkpoint)
        .unwrap();
    let root_diff: Vec<_> = summary
        .changes
        .iter()
        .filter(|r| r.origin == RecordOrigin::RootDiff)
        .collect();
    assert_eq!(root_diff.len(), 1);
    assert_eq!(root_diff[0].event_kind, EventKind::Modified);
}

#[test]
fn test_changes_merge_across_repositories_newest_first() {
    let primary = Arc::new(MemoryRepository::new("default"));
    let secondary = Arc::new(MemoryRepository::new("archive"));
    let ws1 = primary.create_folder("root", "Current").unwrap();
    let ws2 = secondary.create_folder("root", "Old").unwrap();

    let mut engine = SyncEngine::new(&ProjectionConfig::default()).unwrap();
    engine.add_repository(primary.clone());
    engine.add_repository(secondary.clone());
    engine.register_root("alice", "default", &ws1.native_id).unwrap();
    engine.register_root("alice", "archive", &ws2.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");
    assert_eq!(
        checkpoint.root_definitions,
        format!("archive:{},default:{}", ws2.native_id, ws1.native_id)
    );

    primary.create_file(&ws1.native_id, "first.txt", "1").unwrap();
    secondary.create_file(&ws2.native_id, "second.txt", "2").unwrap();
    primary.create_file(&ws1.native_id, "third.txt", "3").unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    let timestamps: Vec<_> = summary.changes.iter().map(|r| r.event_timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(timestamps, sorted);
    assert_eq!(summary.changes.len(), 3);
}

#[test]
fn test_saturated_window_sets_flag_without_partial_list() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let mut engine = SyncEngine::new(&ProjectionConfig {
        change_limit: 4,
        ..ProjectionConfig::default()
    })
    .unwrap();
    engine.add_repository(memory.clone());
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    for i in 0..10 {
        memory
            .create_file(&root.native_id, &format!("f{i}.txt"), "x")
            .unwrap();
    }

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert!(summary.too_many_changes);
    assert!(summary.changes.is_empty());

    // A full-scan client resumes from the advanced checkpoint.
    let summary = engine
        .get_change_summary("alice", &summary.checkpoint)
        .unwrap();
    assert!(!summary.too_many_changes);
    assert!(summary.changes.is_empty());
}

#[test]
fn test_factory_reconfiguration_applies_to_next_poll() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    let file = memory.create_file(&root.native_id, "a.txt", "v1").unwrap();

    // Disable the general factory: the creation can no longer resolve and
    // the record falls back to a deletion shape without an id.
    engine.registry().contribute(
        drive_core::FactoryContribution::new(
            "defaultItemFactory",
            drive_core::FactoryKind::Default,
            50,
        )
        .disabled(),
    );
    engine.registry().rebuild().unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    let record = summary
        .changes
        .iter()
        .find(|r| r.native_id == file.native_id)
        .unwrap();
    assert_eq!(record.event_kind, EventKind::Deleted);
    assert!(record.item_id.is_none());
}

#[test]
fn test_change_summary_wire_shape() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");
    memory.create_file(&root.native_id, "a.txt", "v1").unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    let value = serde_json::to_value(&summary).unwrap();

    assert_eq!(value["tooManyChanges"], false);
    assert!(value["checkpoint"]["rootDefinitions"].is_string());
    let record = &value["changes"][0];
    assert_eq!(record["eventKind"], "documentCreated");
    assert_eq!(record["repositoryId"], "default");
    assert_eq!(record["item"]["kind"], "file");
    assert!(record["itemId"].as_str().unwrap().starts_with("defaultItemFactory/default/"));
}

#[test]
fn test_move_into_root_is_a_single_moved_record() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let root = memory.create_folder("root", "Workspace").unwrap();
    let outside = memory.create_folder("root", "Elsewhere").unwrap();
    let file = memory.create_file(&outside.native_id, "a.txt", "v1").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &root.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    memory.move_document(&file.native_id, &root.native_id).unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 1);
    let record = &summary.changes[0];
    assert_eq!(record.event_kind, EventKind::Moved);
    assert_eq!(record.item.as_ref().unwrap().name(), "a.txt");
}

#[test]
fn test_identical_timestamps_under_two_roots_both_survive() {
    let memory = Arc::new(MemoryRepository::new("default"));
    let ws1 = memory.create_folder("root", "Alpha").unwrap();
    let ws2 = memory.create_folder("root", "Beta").unwrap();
    let a = memory.create_file(&ws1.native_id, "a.txt", "1").unwrap();
    let b = memory.create_file(&ws2.native_id, "b.txt", "2").unwrap();
    let engine = engine_with(&memory);
    engine.register_root("alice", "default", &ws1.native_id).unwrap();
    engine.register_root("alice", "default", &ws2.native_id).unwrap();
    let checkpoint = settled(&engine, "alice");

    let instant = chrono::Utc::now();
    memory.record_at(&a.native_id, EventKind::Modified, instant).unwrap();
    memory.record_at(&b.native_id, EventKind::Modified, instant).unwrap();

    let summary = engine.get_change_summary("alice", &checkpoint).unwrap();
    assert_eq!(summary.changes.len(), 2);
    let mut ids: Vec<&str> = summary.changes.iter().map(|r| r.native_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, [a.native_id.as_str(), b.native_id.as_str()]);
    assert!(summary.changes.iter().all(|r| r.event_timestamp == instant));
}
