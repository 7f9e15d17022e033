//! Unit tests for bvh.rs
//!
//! Covers the structural invariant (node bounds contain descendant leaf
//! bounds), traversal soundness against a brute-force scan, the empty-scene
//! degenerate, and build determinism.

use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use super::*;
use crate::query::{BoundingSphere, Frustum, Ray};
use crate::scene::capability::EntityId;

// ============================================================================
// Test helpers
// ============================================================================

/// Deterministic LCG in [0, 1); keeps the tests reproducible without an
/// RNG dependency.
fn lcg(state: &mut u64) -> f32 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*state >> 40) & 0xFF_FFFF) as f32 / (1u64 << 24) as f32
}

fn random_position(state: &mut u64) -> Vec3 {
    Vec3::new(
        lcg(state) * 200.0 - 100.0,
        lcg(state) * 200.0 - 100.0,
        lcg(state) * 200.0 - 100.0,
    )
}

struct TestWorld {
    transforms: TransformSystem,
    registry: VisibilityRegistry,
    handles: Vec<VisibilityHandle>,
}

fn build_world(count: usize, seed: u64) -> TestWorld {
    let mut entities: SlotMap<EntityId, ()> = SlotMap::with_key();
    let mut transforms = TransformSystem::new();
    let mut registry = VisibilityRegistry::new();
    let mut handles = Vec::with_capacity(count);
    let mut state = seed;

    for _ in 0..count {
        let node = transforms.create_node(random_position(&mut state), Vec3::ONE);
        let handle = registry.create(entities.insert(()), node);
        registry.set_bounding_sphere(
            handle,
            BoundingSphere::from_radius(0.5 + lcg(&mut state) * 2.5),
        );
        handles.push(handle);
    }

    TestWorld {
        transforms,
        registry,
        handles,
    }
}

/// Assert the containment invariant for a subtree; returns the union of its
/// descendant leaf-element AABBs.
fn assert_node_valid(
    bvh: &SceneBvh,
    index: usize,
    registry: &VisibilityRegistry,
    transforms: &TransformSystem,
) -> Aabb {
    let node = &bvh.nodes[index];
    assert!(node.count >= 1 && node.count as usize <= NODE_ARITY);

    let mut union = Aabb::EMPTY;
    if node.leaf {
        for element_index in node.first..node.first + node.count {
            let aabb = registry.world_aabb(
                bvh.elements[element_index as usize].handle,
                transforms,
            );
            assert!(node.bounds.contains(&aabb));
            union = union.union(&aabb);
        }
    } else {
        for child in node.first..node.first + node.count {
            let child_union = assert_node_valid(bvh, child as usize, registry, transforms);
            assert!(node.bounds.contains(&child_union));
            union = union.union(&child_union);
        }
    }
    union
}

fn collect_traversal<V: QueryVolume>(world: &TestWorld, bvh: &SceneBvh, volume: &V) -> Vec<VisibilityHandle> {
    let mut visited = Vec::new();
    bvh.traverse(volume, &world.registry, &world.transforms, &mut |handle, _| {
        visited.push(handle)
    });
    visited.sort_unstable();
    visited
}

fn collect_brute_force<V: QueryVolume>(world: &TestWorld, volume: &V) -> Vec<VisibilityHandle> {
    let mut visited: Vec<VisibilityHandle> = world
        .handles
        .iter()
        .copied()
        .filter(|&handle| {
            let aabb = world.registry.world_aabb(handle, &world.transforms);
            volume.intersect(&aabb).is_some()
        })
        .collect();
    visited.sort_unstable();
    visited
}

// ============================================================================
// Morton encoding
// ============================================================================

#[test]
fn test_morton_bit_layout() {
    // X → bit 3i, Z → bit 3i+1, Y → bit 3i+2
    assert_eq!(morton_encode(1, 0, 0), 0b001);
    assert_eq!(morton_encode(0, 0, 1), 0b010);
    assert_eq!(morton_encode(0, 1, 0), 0b100);
    assert_eq!(morton_encode(2, 0, 0), 0b001_000);
    assert_eq!(morton_encode(3, 3, 3), 0b111_111);
}

#[test]
fn test_morton_full_range_is_27_bits() {
    assert_eq!(morton_encode(511, 511, 511), (1 << 27) - 1);
    // Out-of-range components are masked, not wrapped
    assert_eq!(morton_encode(512, 0, 0), 0);
}

// ============================================================================
// Structural validity
// ============================================================================

#[test]
fn test_node_bounds_contain_descendants_across_sizes() {
    for &count in &[0usize, 1, 4, 5, 17, 1000] {
        let world = build_world(count, 0x5EED + count as u64);
        let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

        assert_eq!(bvh.element_count(), count);
        if count == 0 {
            assert!(bvh.is_empty());
            continue;
        }

        // ceil(count / 4) leaves
        let leaf_count = bvh.nodes.iter().filter(|n| n.leaf).count();
        assert_eq!(leaf_count, count.div_ceil(4));

        assert_node_valid(&bvh, bvh.root as usize, &world.registry, &world.transforms);
    }
}

#[test]
fn test_single_entity_tree_is_one_leaf() {
    let world = build_world(1, 7);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    assert_eq!(bvh.node_count(), 1);
    assert_eq!(bvh.root, 0);
    assert!(bvh.nodes[0].leaf);
}

// ============================================================================
// Traversal soundness vs brute force
// ============================================================================

#[test]
fn test_frustum_traversal_matches_brute_force() {
    let world = build_world(300, 0xF00D);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    let mut state = 0xCA11u64;
    for _ in 0..100 {
        let eye = random_position(&mut state);
        let target = random_position(&mut state);
        if eye.distance(target) < 1.0 {
            continue;
        }
        let projection = Mat4::perspective_rh(
            0.4 + lcg(&mut state) * 1.2,
            1.0 + lcg(&mut state),
            0.1,
            50.0 + lcg(&mut state) * 200.0,
        );
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let frustum = Frustum::from_view_projection(&(projection * view));

        assert_eq!(
            collect_traversal(&world, &bvh, &frustum),
            collect_brute_force(&world, &frustum),
        );
    }
}

#[test]
fn test_aabb_traversal_matches_brute_force() {
    let world = build_world(300, 0xBEEF);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    let mut state = 0xD1CEu64;
    for _ in 0..100 {
        let center = random_position(&mut state);
        let half = 1.0 + lcg(&mut state) * 40.0;
        let volume = Aabb::from_center_radius(center, half);

        assert_eq!(
            collect_traversal(&world, &bvh, &volume),
            collect_brute_force(&world, &volume),
        );
    }
}

#[test]
fn test_ray_traversal_matches_brute_force() {
    let world = build_world(300, 0xFACE);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    let mut state = 0xAB1Eu64;
    for _ in 0..100 {
        let origin = random_position(&mut state);
        let direction = (random_position(&mut state) - origin).normalize_or_zero();
        if direction == Vec3::ZERO {
            continue;
        }
        let ray = Ray::new(origin, direction);

        assert_eq!(
            collect_traversal(&world, &bvh, &ray),
            collect_brute_force(&world, &ray),
        );
    }
}

#[test]
fn test_ray_traversal_reports_entry_distances() {
    let world = build_world(50, 0x1234);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    let ray = Ray::new(Vec3::new(0.0, 0.0, 200.0), Vec3::new(0.0, 0.0, -1.0));
    bvh.traverse(&ray, &world.registry, &world.transforms, &mut |handle, distance| {
        let aabb = world.registry.world_aabb(handle, &world.transforms);
        assert_eq!(ray.intersect_aabb(&aabb), Some(distance));
    });
}

// ============================================================================
// Empty scene degenerate
// ============================================================================

#[test]
fn test_empty_build_traverses_nothing() {
    let world = build_world(0, 1);
    let bvh = SceneBvh::build(&[], &world.registry, &world.transforms);

    assert!(bvh.is_empty());

    let everything = Aabb::from_center_radius(Vec3::ZERO, 1.0e6);
    let mut visits = 0;
    bvh.traverse(&everything, &world.registry, &world.transforms, &mut |_, _| {
        visits += 1
    });
    assert_eq!(visits, 0);

    let ray = Ray::new(Vec3::ZERO, Vec3::X);
    bvh.traverse(&ray, &world.registry, &world.transforms, &mut |_, _| {
        visits += 1
    });
    assert_eq!(visits, 0);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_build_is_deterministic() {
    let world = build_world(137, 0x0DD5);

    let first = SceneBvh::build(&world.handles, &world.registry, &world.transforms);
    let second = SceneBvh::build(&world.handles, &world.registry, &world.transforms);

    assert_eq!(first.element_count(), second.element_count());
    for (a, b) in first.elements.iter().zip(&second.elements) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.handle, b.handle);
    }

    assert_eq!(first.node_count(), second.node_count());
    assert_eq!(first.root, second.root);
    for (a, b) in first.nodes.iter().zip(&second.nodes) {
        assert_eq!(a.first, b.first);
        assert_eq!(a.count, b.count);
        assert_eq!(a.leaf, b.leaf);
    }
}

#[test]
fn test_clone_is_a_deep_copy() {
    let world = build_world(20, 0xC10E);
    let bvh = SceneBvh::build(&world.handles, &world.registry, &world.transforms);
    let retained = bvh.clone();
    drop(bvh);

    // The retained copy is independently traversable
    let everything = Aabb::from_center_radius(Vec3::ZERO, 1.0e6);
    let visited = {
        let mut visited = Vec::new();
        retained.traverse(&everything, &world.registry, &world.transforms, &mut |h, _| {
            visited.push(h)
        });
        visited
    };
    assert_eq!(visited.len(), 20);
}
