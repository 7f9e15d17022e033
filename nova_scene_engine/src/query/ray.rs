/// Ray — origin plus direction, for picking and projectile tests.

use glam::Vec3;
use super::volume::{Aabb, QueryVolume};

/// A ray starting at `origin` and extending along `direction`.
///
/// The direction does not need to be normalized; reported distances are in
/// multiples of its length.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test against an AABB.
    ///
    /// Returns the entry distance (0.0 when the origin is inside the box),
    /// or None when the ray misses or the box lies entirely behind it.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];

            if direction.abs() < f32::EPSILON {
                // Parallel to this slab: miss unless the origin lies within it
                if origin < aabb.min[axis] || origin > aabb.max[axis] {
                    return None;
                }
            } else {
                let inverse = 1.0 / direction;
                let mut t0 = (aabb.min[axis] - origin) * inverse;
                let mut t1 = (aabb.max[axis] - origin) * inverse;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

impl QueryVolume for Ray {
    type Hit = f32;

    fn intersect(&self, aabb: &Aabb) -> Option<f32> {
        self.intersect_aabb(aabb)
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
