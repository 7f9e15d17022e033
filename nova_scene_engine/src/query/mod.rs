//! Geometric query module — volumes and intersection predicates.
//!
//! Provides the query volumes consumed by BVH traversal (frustum, AABB,
//! sphere, ray). All predicates are total over their domain: a query cannot
//! fail, only miss.

mod volume;
mod frustum;
mod ray;

pub use volume::{Aabb, BoundingSphere, QueryVolume};
pub use frustum::{
    Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use ray::Ray;
