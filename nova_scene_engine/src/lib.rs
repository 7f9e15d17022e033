/*!
# Nova Scene Engine

Per-frame scene-query core for a real-time engine.

Every frame the engine rebuilds a spatial index (a Morton-clustered BVH)
over all scene entities and schedules the parallel, dependency-ordered
computation that builds and consumes it: camera frustum culling,
point-light shadow-map invalidation, and ray queries.

## Architecture

- **TaskGraph / TaskPool**: per-frame dependency DAG and its fixed-size
  worker pool executor
- **SceneBvh**: bounding-volume hierarchy rebuilt wholesale each frame
- **VisibilityRegistry**: per-entity visibility records (transform node,
  bounding sphere, flags)
- **Frustum / Ray / Aabb / BoundingSphere**: query volumes consumed by
  BVH traversal
- **PointLightRegistry**: per-light potentially-visible sets and
  shadow-map dirty tracking

GPU submission, asset streaming, and the game-object framework are
external collaborators; this crate holds handles into them, never
ownership.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod query;
pub mod scene;
pub mod task_graph;
pub mod transform;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Task graph sub-module
    pub mod task {
        pub use crate::task_graph::*;
    }

    // Query volume sub-module
    pub mod query {
        pub use crate::query::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Transform sub-module
    pub mod transform {
        pub use crate::transform::*;
    }
}

// Re-export math library at crate root
pub use glam;
