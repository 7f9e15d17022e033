/// Bounding volumes and the traversal predicate trait.

use glam::Vec3;

// ===== AABB =====

/// Axis-Aligned Bounding Box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb {
    /// Inverted box that unions as the identity element.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of half-extent `radius` around `center`.
    pub fn from_center_radius(center: Vec3, radius: f32) -> Self {
        Self {
            min: center - radius,
            max: center + radius,
        }
    }

    /// Smallest AABB enclosing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Compute the center point of this AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extent (max - min).
    pub fn span(&self) -> Vec3 {
        self.max - self.min
    }

    /// True for the inverted (never-unioned) box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this AABB intersects (overlaps) another AABB.
    ///
    /// Returns `true` if the two AABBs overlap or touch.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

// ===== BOUNDING SPHERE =====

/// Sphere used both as a model-space bound on visibility records and as a
/// world-space query volume.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// Sphere center (model-space offset for records, world position for queries)
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centered at the origin.
    pub fn from_radius(radius: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            radius,
        }
    }
}

// ===== QUERY VOLUME =====

/// Intersection predicate consumed by BVH traversal.
///
/// `Hit` carries per-intersection data: nothing for boolean volumes
/// (frustum, AABB, sphere), the entry distance for rays.
pub trait QueryVolume {
    type Hit;

    /// Test this volume against an AABB; `Some` on intersection.
    fn intersect(&self, aabb: &Aabb) -> Option<Self::Hit>;
}

impl QueryVolume for Aabb {
    type Hit = ();

    fn intersect(&self, aabb: &Aabb) -> Option<()> {
        self.intersects(aabb).then_some(())
    }
}

impl QueryVolume for BoundingSphere {
    type Hit = ();

    fn intersect(&self, aabb: &Aabb) -> Option<()> {
        // Distance from sphere center to the closest point of the box.
        let closest = self.center.clamp(aabb.min, aabb.max);
        let distance_squared = (closest - self.center).length_squared();
        (distance_squared <= self.radius * self.radius).then_some(())
    }
}

#[cfg(test)]
#[path = "volume_tests.rs"]
mod tests;
