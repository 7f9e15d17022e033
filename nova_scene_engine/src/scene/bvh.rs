/// Scene BVH — bounding-volume hierarchy rebuilt wholesale every frame.
///
/// Build clusters entities along a Morton curve (spatial sort), then grows
/// the tree bottom-up: runs of ≤4 sorted elements become leaves, groups of
/// ≤4 nodes become interior nodes, until a single root remains. Nodes live
/// in a flat array and reference children by index range — no per-node
/// allocation, the whole tree drops in one free.
///
/// `build` is pure relative to the caller: it reads current records and
/// returns a brand-new value, so the previous frame's BVH stays readable
/// while the next one is built. Retaining a BVH past its frame requires a
/// deep copy (`Clone`).

use glam::Vec3;
use rdst::{RadixKey, RadixSort};
use crate::query::{Aabb, QueryVolume};
use crate::transform::TransformSystem;
use super::visibility::{VisibilityHandle, VisibilityRegistry};

/// Quantization width per axis; three interleaved axes fill 27 bits.
const MORTON_AXIS_BITS: u32 = 9;
/// Mask of one quantized axis component.
const MORTON_AXIS_MASK: u32 = (1 << MORTON_AXIS_BITS) - 1;
/// Max elements per leaf and children per interior node.
const NODE_ARITY: usize = 4;

// ===== MORTON CODE =====

/// Interleave three 9-bit axis components into a 27-bit Morton code.
///
/// Bit layout per input bit i: X at 3i, Z at 3i+1, Y at 3i+2.
fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
    let x = x & MORTON_AXIS_MASK;
    let y = y & MORTON_AXIS_MASK;
    let z = z & MORTON_AXIS_MASK;

    let mut code = 0u32;
    for i in 0..MORTON_AXIS_BITS {
        let x_bit = (x >> i) & 1;
        let y_bit = (y >> i) & 1;
        let z_bit = (z >> i) & 1;
        code |= (x_bit | (z_bit << 1) | (y_bit << 2)) << (3 * i);
    }
    code
}

// ===== ELEMENTS AND NODES =====

/// One sortable entry of the BVH: Morton sort key plus element handle.
/// Recomputed fresh on every build.
#[derive(Debug, Clone, Copy)]
pub struct BvhElement {
    /// Morton code in the high 32 bits, insertion sequence in the low 32.
    /// The sequence makes keys unique, so the unstable radix sort is
    /// deterministic for a fixed input.
    key: u64,
    pub handle: VisibilityHandle,
}

impl RadixKey for BvhElement {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

/// One node of the flat tree.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    /// Union of all descendant leaf AABBs
    pub bounds: Aabb,
    /// First child: element index for leaves, node index otherwise
    first: u32,
    /// Number of children (1..=NODE_ARITY)
    count: u32,
    leaf: bool,
}

// ===== SCENE BVH =====

/// Frame-scoped spatial index over a scene's visibility records.
#[derive(Debug, Clone, Default)]
pub struct SceneBvh {
    elements: Vec<BvhElement>,
    nodes: Vec<BvhNode>,
    root: u32,
}

impl SceneBvh {
    /// Build a BVH over `entities`.
    ///
    /// Never faults: zero entities yield a valid empty tree.
    pub fn build(
        entities: &[VisibilityHandle],
        registry: &VisibilityRegistry,
        transforms: &TransformSystem,
    ) -> SceneBvh {
        if entities.is_empty() {
            return SceneBvh::default();
        }

        // Scene-wide bounds, for normalizing positions into [0,1]³
        let mut scene_bounds = Aabb::EMPTY;
        for &handle in entities {
            scene_bounds = scene_bounds.union(&registry.world_aabb(handle, transforms));
        }
        let offset = scene_bounds.min;
        // Degenerate axes (all entities coplanar) quantize to 0
        let span = scene_bounds.span().max(Vec3::splat(f32::EPSILON));

        let mut elements = Vec::with_capacity(entities.len());
        for (sequence, &handle) in entities.iter().enumerate() {
            let position = transforms.world_position(registry.record(handle).node);
            let normalized = ((position - offset) / span).clamp(Vec3::ZERO, Vec3::ONE);
            let code = morton_encode(
                (normalized.x * MORTON_AXIS_MASK as f32) as u32,
                (normalized.y * MORTON_AXIS_MASK as f32) as u32,
                (normalized.z * MORTON_AXIS_MASK as f32) as u32,
            );
            elements.push(BvhElement {
                key: ((code as u64) << 32) | sequence as u64,
                handle,
            });
        }
        elements.radix_sort_unstable();

        // Phase 1 - leaf nodes over runs of sorted elements
        let mut nodes: Vec<BvhNode> = Vec::with_capacity(entities.len() * 2);
        for (chunk_index, chunk) in elements.chunks(NODE_ARITY).enumerate() {
            let mut bounds = Aabb::EMPTY;
            for element in chunk {
                bounds = bounds.union(&registry.world_aabb(element.handle, transforms));
            }
            nodes.push(BvhNode {
                bounds,
                first: (chunk_index * NODE_ARITY) as u32,
                count: chunk.len() as u32,
                leaf: true,
            });
        }

        // Phase 2 - interior levels until a single root remains
        let mut begin = 0usize;
        loop {
            let end = nodes.len();
            if end - begin <= 1 {
                break;
            }
            let mut first = begin;
            while first < end {
                let last = (first + NODE_ARITY).min(end);
                let mut bounds = Aabb::EMPTY;
                for child in first..last {
                    bounds = bounds.union(&nodes[child].bounds);
                }
                nodes.push(BvhNode {
                    bounds,
                    first: first as u32,
                    count: (last - first) as u32,
                    leaf: false,
                });
                first = last;
            }
            begin = end;
        }

        SceneBvh {
            elements,
            nodes,
            root: begin as u32,
        }
    }

    /// True for the zero-entity tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Visit every element whose exact world AABB intersects `volume`.
    ///
    /// Descends only into nodes whose bounds intersect; leaf elements are
    /// re-tested against their exact AABB (recomputed from the registry, so
    /// results match the transforms frozen for this frame). A no-op on the
    /// empty tree.
    pub fn traverse<V, F>(
        &self,
        volume: &V,
        registry: &VisibilityRegistry,
        transforms: &TransformSystem,
        visitor: &mut F,
    ) where
        V: QueryVolume,
        F: FnMut(VisibilityHandle, V::Hit),
    {
        if self.nodes.is_empty() {
            return;
        }
        self.traverse_node(self.root as usize, volume, registry, transforms, visitor);
    }

    fn traverse_node<V, F>(
        &self,
        index: usize,
        volume: &V,
        registry: &VisibilityRegistry,
        transforms: &TransformSystem,
        visitor: &mut F,
    ) where
        V: QueryVolume,
        F: FnMut(VisibilityHandle, V::Hit),
    {
        let node = &self.nodes[index];

        if volume.intersect(&node.bounds).is_none() {
            return;
        }

        if node.leaf {
            let end = node.first + node.count;
            for element_index in node.first..end {
                let element = &self.elements[element_index as usize];
                let aabb = registry.world_aabb(element.handle, transforms);
                if let Some(hit) = volume.intersect(&aabb) {
                    visitor(element.handle, hit);
                }
            }
        } else {
            let end = node.first + node.count;
            for child in node.first..end {
                self.traverse_node(child as usize, volume, registry, transforms, visitor);
            }
        }
    }
}

#[cfg(test)]
#[path = "bvh_tests.rs"]
mod tests;
