/// Point lights — per-light potentially-visible sets and shadow-map dirty
/// tracking.
///
/// The goal is to skip re-rendering a light's shadow map whenever the exact
/// set of objects visible to it, and their transforms, are unchanged since
/// it was last rendered. The per-frame update fans one sub-task per
/// candidate light out of a single graph task (fork-join); each sub-task
/// owns a disjoint `&mut` to its light record, so no cross-light locking
/// exists during comparison. The scope join guarantees the aggregate step
/// only reads results after every sub-task completed.

use glam::Vec3;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use crate::query::Aabb;
use crate::task_graph::{TaskGraph, TaskHandle};
use crate::transform::{DirtyFlags, NodeHandle, TransformSystem};
use super::bvh::SceneBvh;
use super::scene::{BvhBuild, Scene};
use super::visibility::VisibilityHandle;

new_key_type! {
    /// Stable key for a point light record.
    pub struct PointLightHandle;
}

/// Shadow-cache state of a light for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    /// Cached shadow map still matches the light's visible set
    Clean,
    /// Shadow map must be re-rendered this frame
    Dirty,
    /// Light has never been evaluated
    Unused,
}

/// Resolution assigned when a light's shadow state is first allocated.
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 128;

/// Cached shadow-map bookkeeping, allocated on a light's first evaluation.
#[derive(Debug, Clone)]
pub struct ShadowState {
    /// Previous frame's PVS, sorted by handle value (canonical order)
    pub visible_objects: Vec<VisibilityHandle>,
    /// Cube-map face resolution
    pub shadow_map_size: u32,
}

/// One point light.
#[derive(Debug)]
pub struct PointLightRecord {
    /// Position node in the transform system
    pub node: NodeHandle,
    /// Influence radius; the light's query volume is center ± radius
    pub radius: f32,
    pub intensity: f32,
    pub color: Vec3,
    pub state: LightState,
    pub shadow: Option<ShadowState>,
}

/// Payload of the shadow-candidate gather task.
#[derive(Default)]
pub struct LightGather {
    /// Lights whose entity intersected the camera frustum this frame
    pub lights: Vec<PointLightHandle>,
}

/// Payload of the per-light update task.
#[derive(Default)]
pub struct PointLightUpdate {
    /// Lights requiring shadow re-render, for the render collaborator
    pub dirty: Vec<PointLightHandle>,
}

// ===== REGISTRY =====

/// Registry of point lights for one scene.
pub struct PointLightRegistry {
    lights: SlotMap<PointLightHandle, PointLightRecord>,
}

impl PointLightRegistry {
    pub fn new() -> Self {
        Self {
            lights: SlotMap::with_key(),
        }
    }

    /// Create a light. Starts `Unused` with no shadow state.
    pub fn create(
        &mut self,
        node: NodeHandle,
        radius: f32,
        intensity: f32,
        color: Vec3,
    ) -> PointLightHandle {
        self.lights.insert(PointLightRecord {
            node,
            radius,
            intensity,
            color,
            state: LightState::Unused,
            shadow: None,
        })
    }

    /// Remove a light. Returns false if the handle is stale.
    pub fn remove(&mut self, handle: PointLightHandle) -> bool {
        self.lights.remove(handle).is_some()
    }

    /// Get a record. Panics on a stale handle.
    pub fn record(&self, handle: PointLightHandle) -> &PointLightRecord {
        &self.lights[handle]
    }

    /// Non-panicking lookup, for diagnostics.
    pub fn get(&self, handle: PointLightHandle) -> Option<&PointLightRecord> {
        self.lights.get(handle)
    }

    /// Returns false if the handle is stale.
    pub fn set_radius(&mut self, handle: PointLightHandle, radius: f32) -> bool {
        if let Some(record) = self.lights.get_mut(handle) {
            record.radius = radius;
            true
        } else {
            false
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = PointLightHandle> + '_ {
        self.lights.keys()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Add the per-frame light update task to the graph.
    ///
    /// Inputs: the BVH build and the candidate gather. The execute body
    /// forks one sub-task per candidate light and joins before aggregating
    /// the dirty list handed to the render collaborator.
    pub fn dispatch_update<'env>(
        &'env mut self,
        scene: &'env Scene,
        transforms: &'env TransformSystem,
        graph: &mut TaskGraph<'env>,
        bvh: &TaskHandle<BvhBuild>,
        candidates: &TaskHandle<LightGather>,
    ) -> TaskHandle<PointLightUpdate> {
        let bvh_data = bvh.data();
        let candidate_data = candidates.data();

        graph.add(
            PointLightUpdate::default(),
            |builder, _data| {
                builder.set_debug_label("Update Point Lights");
                builder.add_input(bvh);
                builder.add_input(candidates);
            },
            move |data| {
                let bvh_guard = bvh_data.read();
                let candidate_guard = candidate_data.read();
                let bvh = &bvh_guard.bvh;
                let candidate_set: FxHashSet<PointLightHandle> =
                    candidate_guard.lights.iter().copied().collect();

                let lights = &mut self.lights;
                rayon::scope(|scope| {
                    for (handle, record) in lights.iter_mut() {
                        if !candidate_set.contains(&handle) {
                            continue;
                        }
                        scope.spawn(move |_| update_light(record, bvh, scene, transforms));
                    }
                });

                // Join happened above; every candidate's state is settled.
                for (handle, record) in lights.iter() {
                    if candidate_set.contains(&handle)
                        && record.state == LightState::Dirty
                        && record.shadow.is_some()
                    {
                        data.dirty.push(handle);
                    }
                }
            },
        )
    }
}

impl Default for PointLightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ===== PER-LIGHT SUB-TASK =====

/// Evaluate one light's PVS against its stored shadow state.
fn update_light(
    light: &mut PointLightRecord,
    bvh: &SceneBvh,
    scene: &Scene,
    transforms: &TransformSystem,
) {
    let position = transforms.world_position(light.node);
    let light_bounds = Aabb::from_center_radius(position, light.radius);

    let mut pvs: Vec<VisibilityHandle> = Vec::new();
    bvh.traverse(&light_bounds, scene.visibility(), transforms, &mut |handle, _| {
        pvs.push(handle)
    });
    // Canonical order enables the O(n) positional comparison below
    pvs.sort_unstable();

    let moved = DirtyFlags::DIRTY | DirtyFlags::UPDATED;
    let light_moved = transforms.dirty_flags(light.node).intersects(moved);

    match &mut light.shadow {
        Some(shadow) => {
            let previous = &shadow.visible_objects;
            let set_changed = previous.len() != pvs.len()
                || previous.iter().zip(&pvs).any(|(a, b)| a != b);

            if set_changed {
                light.state = LightState::Dirty;
                shadow.visible_objects = pvs;
            } else if light_moved
                || pvs.iter().any(|&handle| {
                    let node = scene.visibility().record(handle).node;
                    transforms.dirty_flags(node).intersects(moved)
                })
            {
                // Same set, but something moved: re-render without
                // replacing the stored PVS.
                light.state = LightState::Dirty;
            } else {
                light.state = LightState::Clean;
            }
        }
        None => {
            light.shadow = Some(ShadowState {
                visible_objects: pvs,
                shadow_map_size: DEFAULT_SHADOW_MAP_SIZE,
            });
            light.state = LightState::Dirty;
        }
    }
}

#[cfg(test)]
#[path = "point_light_tests.rs"]
mod tests;
