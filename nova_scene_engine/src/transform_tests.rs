//! Unit tests for transform.rs

use glam::Vec3;
use super::*;
use crate::task_graph::{TaskGraph, TaskPool};

// ============================================================================
// Structural operations
// ============================================================================

#[test]
fn test_create_node_stores_world_data() {
    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(2.0));

    assert_eq!(transforms.world_position(node), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(transforms.world_scale(node), Vec3::splat(2.0));
    assert_eq!(transforms.node_count(), 1);
}

#[test]
fn test_new_node_starts_dirty() {
    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::ZERO, Vec3::ONE);

    assert!(transforms.dirty_flags(node).contains(DirtyFlags::DIRTY));
}

#[test]
fn test_set_position_marks_dirty() {
    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::ZERO, Vec3::ONE);
    transforms.clear_flags();

    assert!(transforms.dirty_flags(node).is_empty());
    assert!(transforms.set_position(node, Vec3::X));
    assert_eq!(transforms.world_position(node), Vec3::X);
    assert!(transforms.dirty_flags(node).contains(DirtyFlags::DIRTY));
}

#[test]
fn test_remove_node_invalidates_handle() {
    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::ZERO, Vec3::ONE);

    assert!(transforms.remove_node(node));
    assert!(!transforms.remove_node(node));
    assert!(!transforms.contains(node));
    assert!(!transforms.set_position(node, Vec3::X));
}

#[test]
#[should_panic]
fn test_stale_handle_read_panics() {
    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::ZERO, Vec3::ONE);
    transforms.remove_node(node);

    let _ = transforms.world_position(node);
}

// ============================================================================
// Per-frame update task
// ============================================================================

#[test]
fn test_update_task_promotes_dirty_to_updated() {
    let pool = TaskPool::new(2).unwrap();

    let mut transforms = TransformSystem::new();
    let moving = transforms.create_node(Vec3::ZERO, Vec3::ONE);
    let still = transforms.create_node(Vec3::ONE, Vec3::ONE);
    transforms.clear_flags();

    transforms.set_position(moving, Vec3::new(5.0, 0.0, 0.0));

    let mut graph = TaskGraph::new();
    let update = transforms.dispatch_update(&mut graph);
    graph.execute(&pool).unwrap();

    assert_eq!(update.read().updated, 1);
    assert_eq!(
        transforms.dirty_flags(moving),
        DirtyFlags::DIRTY | DirtyFlags::UPDATED
    );
    assert!(transforms.dirty_flags(still).is_empty());
}

#[test]
fn test_clear_flags_resets_all() {
    let pool = TaskPool::new(2).unwrap();

    let mut transforms = TransformSystem::new();
    let node = transforms.create_node(Vec3::ZERO, Vec3::ONE);

    let mut graph = TaskGraph::new();
    transforms.dispatch_update(&mut graph);
    graph.execute(&pool).unwrap();
    assert!(!transforms.dirty_flags(node).is_empty());

    transforms.clear_flags();
    assert!(transforms.dirty_flags(node).is_empty());
}
