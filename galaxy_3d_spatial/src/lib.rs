/*!
# Galaxy 3D Spatial

Dynamic spatial indexing for the Galaxy 3D engine.

This crate tracks a changing set of point-positioned elements (entity ids,
handles...) and answers box range queries over them. The index needs no
world extent up front: its root grows toward whatever position it is given.

## Architecture

- **Octree**: Self-growing octree with lazy subdivision
- **OctreeLock**: Guard passed to every octree operation
- **OctreeConfig**: Origin, initial depth and minimum node size
- **AABB**: Half-open axis-aligned box and octant math

Diagnostics go through a replaceable global logger (see `galaxy3d::log`).
*/

// Internal modules
mod error;
pub mod log;
pub mod spatial;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types and logger installation, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger};
    }

    // Spatial sub-module with the octree and its types
    pub mod spatial {
        pub use crate::spatial::*;
    }
}

// Re-export math library at crate root
pub use glam;
