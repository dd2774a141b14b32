//! Spatial indexing module
//!
//! Provides the dynamic octree used to find elements by position, along
//! with the bounding box and octant math it is built on.

mod aabb;
mod octree;
mod octree_config;
mod octree_lock;
mod octree_node;

pub use aabb::{AABB, OCTANT_COUNT, OCTANT_POS_X, OCTANT_POS_Y, OCTANT_POS_Z};
pub use octree::Octree;
pub use octree_config::OctreeConfig;
pub use octree_lock::OctreeLock;
