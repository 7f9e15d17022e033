/// Visibility registry — per-entity visibility records.
///
/// One record per entity in the scene: entity back-reference, transform
/// node, model-space bounding sphere, visible/transparent flags. The world
/// AABB is derived on demand from the transform system and never cached;
/// frame consistency is the caller's responsibility, enforced by ordering
/// (the transform update task precedes the BVH build task).
///
/// Structural mutation (create/remove) takes `&mut self` and is therefore
/// only reachable from the main/update thread; worker tasks read the table
/// concurrently through `&self` without locking.

use slotmap::{new_key_type, SlotMap};
use crate::query::{Aabb, BoundingSphere};
use crate::transform::{NodeHandle, TransformSystem};
use super::capability::EntityId;

new_key_type! {
    /// Stable key for a visibility record.
    ///
    /// Keys remain valid until their own record is removed. Dereferencing
    /// a removed key panics (programming fault, fail-fast).
    pub struct VisibilityHandle;
}

/// Per-entity visibility state.
#[derive(Debug, Clone)]
pub struct VisibilityRecord {
    /// Owning game object (diagnostics and capability lookup only)
    pub entity: EntityId,
    /// Transform node the world AABB is derived from
    pub node: NodeHandle,
    /// Model-space bounding sphere
    pub bounding_sphere: BoundingSphere,
    /// Excluded from camera gathers when false
    pub visible: bool,
    /// Routed to the transparent PVS when true
    pub transparent: bool,
}

/// Registry of visibility records for one scene.
pub struct VisibilityRegistry {
    records: SlotMap<VisibilityHandle, VisibilityRecord>,
}

impl VisibilityRegistry {
    pub fn new() -> Self {
        Self {
            records: SlotMap::with_key(),
        }
    }

    /// Create a record for an entity joining the scene.
    ///
    /// The bounding sphere defaults to a unit sphere at the node origin;
    /// callers refine it with `set_bounding_sphere`.
    pub fn create(&mut self, entity: EntityId, node: NodeHandle) -> VisibilityHandle {
        self.records.insert(VisibilityRecord {
            entity,
            node,
            bounding_sphere: BoundingSphere::from_radius(1.0),
            visible: true,
            transparent: false,
        })
    }

    /// Remove a record (entity left the scene). Returns false if stale.
    pub fn remove(&mut self, handle: VisibilityHandle) -> bool {
        self.records.remove(handle).is_some()
    }

    /// Returns false if the handle is stale.
    pub fn set_visible(&mut self, handle: VisibilityHandle, visible: bool) -> bool {
        if let Some(record) = self.records.get_mut(handle) {
            record.visible = visible;
            true
        } else {
            false
        }
    }

    /// Returns false if the handle is stale.
    pub fn set_transparent(&mut self, handle: VisibilityHandle, transparent: bool) -> bool {
        if let Some(record) = self.records.get_mut(handle) {
            record.transparent = transparent;
            true
        } else {
            false
        }
    }

    /// Returns false if the handle is stale.
    pub fn set_bounding_sphere(&mut self, handle: VisibilityHandle, sphere: BoundingSphere) -> bool {
        if let Some(record) = self.records.get_mut(handle) {
            record.bounding_sphere = sphere;
            true
        } else {
            false
        }
    }

    /// Get a record. Panics on a stale handle.
    pub fn record(&self, handle: VisibilityHandle) -> &VisibilityRecord {
        &self.records[handle]
    }

    /// Non-panicking lookup, for diagnostics.
    pub fn get(&self, handle: VisibilityHandle) -> Option<&VisibilityRecord> {
        self.records.get(handle)
    }

    /// Recompute the record's world AABB from the transform system's current
    /// world position/scale and the stored bounding sphere. Never cached.
    pub fn world_aabb(&self, handle: VisibilityHandle, transforms: &TransformSystem) -> Aabb {
        let record = &self.records[handle];
        let position = transforms.world_position(record.node);
        let scale = transforms.world_scale(record.node);

        let center = position + record.bounding_sphere.center * scale;
        let radius = record.bounding_sphere.radius * scale.max_element();
        Aabb::from_center_radius(center, radius)
    }

    /// Iterate over all handles (scene membership, in registry order).
    pub fn handles(&self) -> impl Iterator<Item = VisibilityHandle> + '_ {
        self.records.keys()
    }

    /// Iterate over all (handle, record) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (VisibilityHandle, &VisibilityRecord)> {
        self.records.iter()
    }

    pub fn contains(&self, handle: VisibilityHandle) -> bool {
        self.records.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for VisibilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
