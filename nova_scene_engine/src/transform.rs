/// Transform collaborator — flat world-transform table with dirty tracking.
///
/// Structural mutation (create/remove/set) takes `&mut self` and therefore
/// only happens on the main/update thread, before the frame graph runs.
/// Worker tasks read positions, scales, and dirty flags through `&self`;
/// the per-frame update task promotes flags through per-node atomics, so it
/// also runs on a plain shared reference.
///
/// Dereferencing a removed or never-created node panics — a stale handle is
/// a programming fault, not a runtime condition.

use std::sync::atomic::{AtomicU32, Ordering};
use bitflags::bitflags;
use glam::Vec3;
use slotmap::{new_key_type, SlotMap};
use crate::task_graph::{TaskGraph, TaskHandle};

new_key_type! {
    /// Stable key for a transform node.
    pub struct NodeHandle;
}

bitflags! {
    /// Per-node change flags for the current frame.
    ///
    /// `DIRTY` is set by structural setters; the update task adds `UPDATED`
    /// for every dirty node. Both are cleared by `clear_flags()` at frame end.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        const DIRTY   = 1 << 0;
        const UPDATED = 1 << 1;
    }
}

/// Payload of the per-frame transform update task.
#[derive(Default)]
pub struct TransformUpdate {
    /// Number of nodes promoted to UPDATED this frame
    pub updated: usize,
}

struct TransformNode {
    position: Vec3,
    scale: Vec3,
    flags: AtomicU32,
}

/// Flat table of world transforms.
pub struct TransformSystem {
    nodes: SlotMap<NodeHandle, TransformNode>,
}

impl TransformSystem {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Create a node. New nodes start DIRTY so the first frame picks them up.
    pub fn create_node(&mut self, position: Vec3, scale: Vec3) -> NodeHandle {
        self.nodes.insert(TransformNode {
            position,
            scale,
            flags: AtomicU32::new(DirtyFlags::DIRTY.bits()),
        })
    }

    /// Remove a node. Returns false if the handle is stale.
    pub fn remove_node(&mut self, node: NodeHandle) -> bool {
        self.nodes.remove(node).is_some()
    }

    /// Set a node's world position and mark it DIRTY.
    /// Returns false if the handle is stale.
    pub fn set_position(&mut self, node: NodeHandle, position: Vec3) -> bool {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.position = position;
            entry.flags.fetch_or(DirtyFlags::DIRTY.bits(), Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// Set a node's world scale and mark it DIRTY.
    /// Returns false if the handle is stale.
    pub fn set_scale(&mut self, node: NodeHandle, scale: Vec3) -> bool {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.scale = scale;
            entry.flags.fetch_or(DirtyFlags::DIRTY.bits(), Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// Current world position of a node.
    pub fn world_position(&self, node: NodeHandle) -> Vec3 {
        self.nodes[node].position
    }

    /// Current world scale of a node.
    pub fn world_scale(&self, node: NodeHandle) -> Vec3 {
        self.nodes[node].scale
    }

    /// Change flags accumulated on a node this frame.
    pub fn dirty_flags(&self, node: NodeHandle) -> DirtyFlags {
        DirtyFlags::from_bits_truncate(self.nodes[node].flags.load(Ordering::Acquire))
    }

    pub fn contains(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add the per-frame transform update task to the graph.
    ///
    /// Every node marked DIRTY since the last `clear_flags()` is promoted to
    /// DIRTY | UPDATED; downstream tasks (BVH build, light update) declare
    /// this task as an input so flag reads observe a settled frame.
    pub fn dispatch_update<'env>(
        &'env self,
        graph: &mut TaskGraph<'env>,
    ) -> TaskHandle<TransformUpdate> {
        graph.add(
            TransformUpdate::default(),
            |builder, _data| {
                builder.set_debug_label("Update Transforms");
            },
            move |data| {
                let mut updated = 0;
                for node in self.nodes.values() {
                    let flags = node.flags.load(Ordering::Acquire);
                    if flags & DirtyFlags::DIRTY.bits() != 0 {
                        node.flags.fetch_or(DirtyFlags::UPDATED.bits(), Ordering::AcqRel);
                        updated += 1;
                    }
                }
                data.updated = updated;
            },
        )
    }

    /// Clear all change flags. Called on the main thread at frame end.
    pub fn clear_flags(&mut self) {
        for node in self.nodes.values_mut() {
            *node.flags.get_mut() = 0;
        }
    }
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
