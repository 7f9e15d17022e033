//! Demo: two frames of the scene-query pipeline.
//!
//! Builds a small world (a ring of objects, two shadow-casting point
//! lights), runs the per-frame task graph twice, and prints what the
//! renderer would receive: the sorted camera PVS and the lights whose
//! shadow maps need re-rendering. Between the frames one object moves,
//! so only the light covering it goes dirty.

use slotmap::SlotMap;

use nova_scene_engine::glam::{Mat4, Vec3};
use nova_scene_engine::nova3d::{Engine, Result};
use nova_scene_engine::query::{Frustum, Ray};
use nova_scene_engine::scene::{
    EntityId, PointLightHandle, PointLightRegistry, Scene, SceneBvh, VisibilityHandle,
    POINT_LIGHT_CAPABILITY,
};
use nova_scene_engine::task_graph::TaskGraph;
use nova_scene_engine::transform::TransformSystem;

struct World {
    entities: SlotMap<EntityId, String>,
    transforms: TransformSystem,
    scene: Scene,
    lights: PointLightRegistry,
}

fn build_world() -> (World, Vec<VisibilityHandle>, Vec<PointLightHandle>) {
    let mut entities: SlotMap<EntityId, String> = SlotMap::with_key();
    let mut transforms = TransformSystem::new();
    let mut scene = Scene::new();
    let mut lights = PointLightRegistry::new();

    // A ring of objects around the origin
    let mut handles = Vec::new();
    for i in 0..12 {
        let angle = i as f32 / 12.0 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * 20.0, 0.0, angle.sin() * 20.0);
        let node = transforms.create_node(position, Vec3::ONE);
        let entity = entities.insert(format!("object-{}", i));
        handles.push(scene.add_entity(entity, node));
    }

    // Two point lights on opposite sides of the ring
    let mut light_handles = Vec::new();
    for (name, x) in [("light-east", 20.0f32), ("light-west", -20.0)] {
        let entity = entities.insert(name.to_string());
        let node = transforms.create_node(Vec3::new(x, 2.0, 0.0), Vec3::ONE);
        scene.add_entity(entity, node);
        let light = lights.create(node, 8.0, 150.0, Vec3::new(1.0, 0.9, 0.7));
        scene
            .capabilities_mut()
            .register(entity, POINT_LIGHT_CAPABILITY, light);
        light_handles.push(light);
    }

    (
        World {
            entities,
            transforms,
            scene,
            lights,
        },
        handles,
        light_handles,
    )
}

/// Run one frame of the scene-query graph; returns a retained copy of the
/// frame's BVH for post-frame ray casts.
fn run_frame(world: &mut World, frame: usize) -> Result<SceneBvh> {
    let pool = Engine::task_pool()?;

    let eye = Vec3::new(0.0, 30.0, 60.0);
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 500.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let frustum = Frustum::from_view_projection(&(projection * view));

    let World {
        entities,
        transforms,
        scene,
        lights,
    } = world;

    let mut graph = TaskGraph::new();
    let transform_update = transforms.dispatch_update(&mut graph);
    let bvh = scene.dispatch_bvh_build(transforms, &mut graph, &transform_update);
    let gather = scene.dispatch_gather(transforms, &mut graph, &bvh, frustum, eye);
    let light_gather = scene.dispatch_light_gather(transforms, &mut graph, &bvh, frustum);
    let light_update = lights.dispatch_update(scene, transforms, &mut graph, &bvh, &light_gather);

    graph.execute(&pool)?;

    let pvs = gather.read();
    println!(
        "frame {}: {} solid / {} transparent entities visible",
        frame,
        pvs.solid.len(),
        pvs.transparent.len()
    );
    if let Some(nearest) = pvs.solid.first() {
        let name = &entities[scene.visibility().record(nearest.handle).entity];
        println!("  nearest: {} at {:.1} units", name, nearest.distance);
    }

    let dirty = light_update.read();
    if dirty.dirty.is_empty() {
        println!("  no shadow maps to re-render");
    }
    for &light in &dirty.dirty {
        if let Some(shadow) = lights.record(light).shadow.as_ref() {
            println!(
                "  re-render shadow map ({0}x{0}) for light covering {1} objects",
                shadow.shadow_map_size,
                shadow.visible_objects.len()
            );
        }
    }

    // Retain the frame's BVH for post-frame queries
    let result = bvh.read().bvh.clone();
    Ok(result)
}

fn main() -> Result<()> {
    Engine::initialize()?;
    Engine::create_task_pool(4)?;

    let (mut world, handles, _lights) = build_world();

    let bvh = run_frame(&mut world, 1)?;

    // Pick at the east side of the ring through the retained BVH
    let ray = Ray::new(Vec3::new(60.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
    let hits = world.scene.ray_cast(&ray, &bvh, &world.transforms);
    println!("ray from +x picks {} objects", hits.len());

    // Frame boundary: flags settle, then one object moves
    world.transforms.clear_flags();
    let moved = world.scene.visibility().record(handles[0]).node;
    world.transforms.set_position(moved, Vec3::new(21.0, 0.0, 1.0));

    run_frame(&mut world, 2)?;

    Engine::shutdown();
    Ok(())
}
