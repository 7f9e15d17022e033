//! Scene-query module
//!
//! Provides the visibility registry, the per-frame BVH, point-light shadow
//! dirty tracking, the capability table, and the Scene type that wires the
//! per-frame task graph together.

mod capability;
mod visibility;
mod bvh;
mod point_light;
mod scene;

pub use capability::{
    CapabilityTable, ComponentTypeId, EntityId,
    POINT_LIGHT_CAPABILITY, VISIBILITY_CAPABILITY,
};
pub use visibility::{VisibilityHandle, VisibilityRecord, VisibilityRegistry};
pub use bvh::{BvhElement, BvhNode, SceneBvh};
pub use point_light::{
    LightGather, LightState, PointLightHandle, PointLightRecord, PointLightRegistry,
    PointLightUpdate, ShadowState, DEFAULT_SHADOW_MAP_SIZE,
};
pub use scene::{BvhBuild, PvsEntry, RayCasts, RayHit, Scene, SceneGather};
