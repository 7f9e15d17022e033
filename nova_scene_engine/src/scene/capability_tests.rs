//! Unit tests for capability.rs

use slotmap::SlotMap;
use super::*;
use crate::scene::point_light::PointLightHandle;
use crate::scene::visibility::VisibilityHandle;

fn make_entities(count: usize) -> (SlotMap<EntityId, ()>, Vec<EntityId>) {
    let mut world = SlotMap::with_key();
    let ids = (0..count).map(|_| world.insert(())).collect();
    (world, ids)
}

// ============================================================================
// Register / lookup
// ============================================================================

#[test]
fn test_lookup_returns_registered_handle() {
    let (_world, entities) = make_entities(1);
    let mut lights: SlotMap<PointLightHandle, ()> = SlotMap::with_key();
    let light = lights.insert(());

    let mut table = CapabilityTable::new();
    table.register(entities[0], POINT_LIGHT_CAPABILITY, light);

    let found: PointLightHandle = table
        .lookup(entities[0], POINT_LIGHT_CAPABILITY)
        .unwrap();
    assert_eq!(found, light);
}

#[test]
fn test_lookup_missing_capability_is_none() {
    let (_world, entities) = make_entities(1);
    let table = CapabilityTable::new();

    let found: Option<PointLightHandle> =
        table.lookup(entities[0], POINT_LIGHT_CAPABILITY);
    assert!(found.is_none());
    assert!(!table.has(entities[0], POINT_LIGHT_CAPABILITY));
}

#[test]
fn test_capabilities_are_scoped_per_type_id() {
    let (_world, entities) = make_entities(1);
    let mut visibles: SlotMap<VisibilityHandle, ()> = SlotMap::with_key();
    let visible = visibles.insert(());

    let mut table = CapabilityTable::new();
    table.register(entities[0], VISIBILITY_CAPABILITY, visible);

    assert!(table.has(entities[0], VISIBILITY_CAPABILITY));
    assert!(!table.has(entities[0], POINT_LIGHT_CAPABILITY));
}

#[test]
fn test_register_replaces_previous() {
    let (_world, entities) = make_entities(1);
    let mut lights: SlotMap<PointLightHandle, ()> = SlotMap::with_key();
    let first = lights.insert(());
    let second = lights.insert(());

    let mut table = CapabilityTable::new();
    table.register(entities[0], POINT_LIGHT_CAPABILITY, first);
    table.register(entities[0], POINT_LIGHT_CAPABILITY, second);

    let found: PointLightHandle = table
        .lookup(entities[0], POINT_LIGHT_CAPABILITY)
        .unwrap();
    assert_eq!(found, second);
    assert_eq!(table.len(), 1);
}

// ============================================================================
// Unregister / clear
// ============================================================================

#[test]
fn test_unregister() {
    let (_world, entities) = make_entities(1);
    let mut lights: SlotMap<PointLightHandle, ()> = SlotMap::with_key();
    let light = lights.insert(());

    let mut table = CapabilityTable::new();
    table.register(entities[0], POINT_LIGHT_CAPABILITY, light);

    assert!(table.unregister(entities[0], POINT_LIGHT_CAPABILITY));
    assert!(!table.unregister(entities[0], POINT_LIGHT_CAPABILITY));
    assert!(table.is_empty());
}

#[test]
fn test_clear_entity_drops_all_its_capabilities() {
    let (_world, entities) = make_entities(2);
    let mut lights: SlotMap<PointLightHandle, ()> = SlotMap::with_key();
    let mut visibles: SlotMap<VisibilityHandle, ()> = SlotMap::with_key();

    let mut table = CapabilityTable::new();
    table.register(entities[0], POINT_LIGHT_CAPABILITY, lights.insert(()));
    table.register(entities[0], VISIBILITY_CAPABILITY, visibles.insert(()));
    table.register(entities[1], VISIBILITY_CAPABILITY, visibles.insert(()));

    table.clear_entity(entities[0]);

    assert!(!table.has(entities[0], POINT_LIGHT_CAPABILITY));
    assert!(!table.has(entities[0], VISIBILITY_CAPABILITY));
    assert!(table.has(entities[1], VISIBILITY_CAPABILITY));
}
