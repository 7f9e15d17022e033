/// Scene — entity membership plus the per-frame scene-query tasks.
///
/// Owns the visibility registry and the capability table. Point lights live
/// in their own registry so the light update task can mutate light state
/// while sibling tasks read the scene.
///
/// Per-frame dataflow (each constructor wires its own inputs):
/// transform update → BVH build → { camera gather, light gather } →
/// point light update. The BVH payload is a frame-scoped value owned by the
/// build task; consumers read it through the task's data handle, and it
/// dies with the graph unless deep-copied out.

use glam::Vec3;
use crate::engine_debug;
use crate::query::{Frustum, Ray};
use crate::task_graph::{TaskGraph, TaskHandle};
use crate::transform::{TransformSystem, TransformUpdate};
use super::bvh::SceneBvh;
use super::capability::{
    CapabilityTable, EntityId, POINT_LIGHT_CAPABILITY, VISIBILITY_CAPABILITY,
};
use super::point_light::{LightGather, PointLightHandle};
use super::visibility::{VisibilityHandle, VisibilityRegistry};

// ===== TASK PAYLOADS =====

/// Payload of the BVH build task: the frame's spatial index.
#[derive(Default)]
pub struct BvhBuild {
    pub bvh: SceneBvh,
}

/// One entry of a potentially-visible set.
#[derive(Debug, Clone, Copy)]
pub struct PvsEntry {
    pub handle: VisibilityHandle,
    /// Distance from the camera position, for draw ordering
    pub distance: f32,
}

/// Payload of the camera gather task.
#[derive(Default)]
pub struct SceneGather {
    /// Opaque entities, sorted front-to-back
    pub solid: Vec<PvsEntry>,
    /// Transparent entities, unsorted (the drawer orders them)
    pub transparent: Vec<PvsEntry>,
}

/// One ray-cast hit, nearest first in `Scene::ray_cast` results.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub handle: VisibilityHandle,
    pub entity: EntityId,
    pub distance: f32,
}

/// Payload of the batched ray query task.
///
/// `rays` is populated at setup time (picking, projectile tests queued for
/// this frame); `hits[i]` holds the sorted results of `rays[i]`.
#[derive(Default)]
pub struct RayCasts {
    pub rays: Vec<Ray>,
    pub hits: Vec<Vec<RayHit>>,
}

// ===== SCENE =====

/// A scene: the set of entities participating in visibility queries.
pub struct Scene {
    visibility: VisibilityRegistry,
    capabilities: CapabilityTable,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            visibility: VisibilityRegistry::new(),
            capabilities: CapabilityTable::new(),
        }
    }

    /// Add an entity to the scene: creates its visibility record and
    /// registers the visibility capability.
    pub fn add_entity(
        &mut self,
        entity: EntityId,
        node: crate::transform::NodeHandle,
    ) -> VisibilityHandle {
        let handle = self.visibility.create(entity, node);
        self.capabilities
            .register(entity, VISIBILITY_CAPABILITY, handle);
        handle
    }

    /// Remove an entity's visibility record and all its capability
    /// registrations. Returns false if the handle is stale.
    pub fn remove_entity(&mut self, handle: VisibilityHandle) -> bool {
        let Some(record) = self.visibility.get(handle) else {
            return false;
        };
        let entity = record.entity;
        self.capabilities.clear_entity(entity);
        self.visibility.remove(handle)
    }

    pub fn visibility(&self) -> &VisibilityRegistry {
        &self.visibility
    }

    /// Structural mutation path; main/update thread only, before the frame
    /// graph is scheduled.
    pub fn visibility_mut(&mut self) -> &mut VisibilityRegistry {
        &mut self.visibility
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut CapabilityTable {
        &mut self.capabilities
    }

    pub fn entity_count(&self) -> usize {
        self.visibility.len()
    }

    // ===== FRAME TASKS =====

    /// Add the BVH build task.
    ///
    /// Declares the transform update as its input: registry mutation ended
    /// before the graph was scheduled, and transforms settle before the
    /// build reads them.
    pub fn dispatch_bvh_build<'env>(
        &'env self,
        transforms: &'env TransformSystem,
        graph: &mut TaskGraph<'env>,
        transform_update: &TaskHandle<TransformUpdate>,
    ) -> TaskHandle<BvhBuild> {
        graph.add(
            BvhBuild::default(),
            |builder, _data| {
                builder.set_debug_label("Build BVH");
                builder.add_input(transform_update);
            },
            move |data| {
                engine_debug!("nova3d::Scene", "Build BVH ({} entities)", self.visibility.len());
                let entities: Vec<VisibilityHandle> = self.visibility.handles().collect();
                data.bvh = SceneBvh::build(&entities, &self.visibility, transforms);
            },
        )
    }

    /// Add the camera gather task: the frustum PVS, split into solid and
    /// transparent lists, solid sorted front-to-back by camera distance.
    pub fn dispatch_gather<'env>(
        &'env self,
        transforms: &'env TransformSystem,
        graph: &mut TaskGraph<'env>,
        bvh: &TaskHandle<BvhBuild>,
        frustum: Frustum,
        camera_position: Vec3,
    ) -> TaskHandle<SceneGather> {
        let bvh_data = bvh.data();
        graph.add(
            SceneGather::default(),
            |builder, _data| {
                builder.set_debug_label("Gather Scene");
                builder.add_input(bvh);
            },
            move |data| {
                let guard = bvh_data.read();
                guard
                    .bvh
                    .traverse(&frustum, &self.visibility, transforms, &mut |handle, _| {
                        let record = self.visibility.record(handle);
                        if !record.visible {
                            return;
                        }
                        let distance =
                            (transforms.world_position(record.node) - camera_position).length();
                        let entry = PvsEntry { handle, distance };
                        if record.transparent {
                            data.transparent.push(entry);
                        } else {
                            data.solid.push(entry);
                        }
                    });

                data.solid
                    .sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance));
            },
        )
    }

    /// Add the shadow-candidate gather task: every frustum-visible entity
    /// carrying the point-light capability.
    pub fn dispatch_light_gather<'env>(
        &'env self,
        transforms: &'env TransformSystem,
        graph: &mut TaskGraph<'env>,
        bvh: &TaskHandle<BvhBuild>,
        frustum: Frustum,
    ) -> TaskHandle<LightGather> {
        let bvh_data = bvh.data();
        graph.add(
            LightGather::default(),
            |builder, _data| {
                builder.set_debug_label("Gather Shadow Casting Lights");
                builder.add_input(bvh);
            },
            move |data| {
                let guard = bvh_data.read();
                guard
                    .bvh
                    .traverse(&frustum, &self.visibility, transforms, &mut |handle, _| {
                        let entity = self.visibility.record(handle).entity;
                        if let Some(light) = self
                            .capabilities
                            .lookup::<PointLightHandle>(entity, POINT_LIGHT_CAPABILITY)
                        {
                            data.lights.push(light);
                        }
                    });
            },
        )
    }

    /// Add the batched ray query task: every queued ray is cast against
    /// the frame's BVH once the build completes. Runs concurrently with the
    /// other consumer tasks.
    pub fn dispatch_ray_casts<'env>(
        &'env self,
        transforms: &'env TransformSystem,
        graph: &mut TaskGraph<'env>,
        bvh: &TaskHandle<BvhBuild>,
        rays: Vec<Ray>,
    ) -> TaskHandle<RayCasts> {
        let bvh_data = bvh.data();
        graph.add(
            RayCasts {
                rays,
                hits: Vec::new(),
            },
            |builder, _data| {
                builder.set_debug_label("Ray Queries");
                builder.add_input(bvh);
            },
            move |data| {
                let guard = bvh_data.read();
                data.hits = data
                    .rays
                    .iter()
                    .map(|ray| self.ray_cast(ray, &guard.bvh, transforms))
                    .collect();
            },
        )
    }

    // ===== DIRECT QUERIES =====

    /// Cast a ray through a BVH, returning hits sorted nearest-first.
    ///
    /// Works against the current frame's BVH or any retained deep copy.
    pub fn ray_cast(
        &self,
        ray: &Ray,
        bvh: &SceneBvh,
        transforms: &TransformSystem,
    ) -> Vec<RayHit> {
        let mut hits = Vec::new();
        bvh.traverse(ray, &self.visibility, transforms, &mut |handle, distance| {
            let record = self.visibility.record(handle);
            hits.push(RayHit {
                handle,
                entity: record.entity,
                distance,
            });
        });
        hits.sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
