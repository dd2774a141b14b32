//! OctreeConfig - construction parameters for a dynamic octree.

use glam::Vec3;
use crate::error::{Error, Result};
use super::aabb::AABB;

/// Construction parameters for [`Octree`](super::Octree).
///
/// The initial root is a cube centered on `origin` with edge length
/// `minimum_node_size * 2^initial_levels`. The root grows on demand,
/// so the initial size only decides how many growth steps are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Center of the initial root cube.
    pub origin: Vec3,

    /// Number of subdivision levels the initial root spans.
    pub initial_levels: u32,

    /// Smallest edge length a node may be subdivided to.
    pub minimum_node_size: f32,
}

impl OctreeConfig {
    /// Edge length of the initial root cube.
    #[inline]
    pub fn initial_edge_length(&self) -> f32 {
        self.minimum_node_size * 2.0_f32.powi(self.initial_levels.min(i32::MAX as u32) as i32)
    }

    /// Bounds of the initial root cube.
    pub fn initial_bounds(&self) -> AABB {
        AABB::from_center_edge(self.origin, self.initial_edge_length())
    }

    /// Check that the parameters describe a usable octree.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if:
    /// - `origin` has a NaN or infinite coordinate
    /// - `minimum_node_size` is not a finite, strictly positive number
    /// - the initial edge length overflows `f32`
    pub fn validate(&self) -> Result<()> {
        if !self.origin.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "origin must be finite, got {:?}", self.origin
            )));
        }

        if !self.minimum_node_size.is_finite() || self.minimum_node_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "minimum_node_size must be finite and > 0, got {}", self.minimum_node_size
            )));
        }

        let edge = self.initial_edge_length();
        if !edge.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "initial_levels {} overflows the initial edge length", self.initial_levels
            )));
        }

        Ok(())
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            initial_levels: 4,
            minimum_node_size: 1.0,
        }
    }
}
