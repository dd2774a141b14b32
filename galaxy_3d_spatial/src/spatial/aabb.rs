//! AABB - half-open axis-aligned box and the octant math built on it.
//!
//! A box covers `[min, max)` on every axis: a point sitting exactly on a
//! `max` face belongs to the neighbouring box. This keeps the eight octants
//! of a node disjoint, so every position routes to exactly one child.
//!
//! Octant bit layout (3-bit code):
//! - bit0 = toward +Z
//! - bit1 = toward +Y
//! - bit2 = toward +X

use glam::Vec3;

/// Octant bit set when a point lies on the +Z side of the partition
pub const OCTANT_POS_Z: u8 = 1 << 0;
/// Octant bit set when a point lies on the +Y side of the partition
pub const OCTANT_POS_Y: u8 = 1 << 1;
/// Octant bit set when a point lies on the +X side of the partition
pub const OCTANT_POS_X: u8 = 1 << 2;

/// Number of octants (children) per node
pub const OCTANT_COUNT: usize = 8;

/// Half-open axis-aligned bounding box `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (inclusive)
    pub min: Vec3,
    /// Maximum corner (exclusive)
    pub max: Vec3,
}

impl AABB {
    /// Create a box from its inclusive min and exclusive max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a cube of edge length `edge` centered on `center`.
    pub fn from_center_edge(center: Vec3, edge: f32) -> Self {
        let half = Vec3::splat(edge * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Extent of the box on each axis (max - min).
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest edge of the box. Octree nodes are cubes, so this is their edge.
    #[inline]
    pub fn edge_length(&self) -> f32 {
        self.size().max_element()
    }

    /// Midpoint of the box; the split point between its octants.
    #[inline]
    pub fn partition(&self) -> Vec3 {
        // Halve first so boxes near the f32 limits do not overflow
        self.min * 0.5 + self.max * 0.5
    }

    /// Test if a point lies in `[min, max)` on all three axes.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x < self.max.x
        && point.y >= self.min.y && point.y < self.max.y
        && point.z >= self.min.z && point.z < self.max.z
    }

    /// Test if two half-open boxes share at least one point.
    ///
    /// Boxes that only touch along a face do not intersect.
    #[inline]
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x < other.max.x && other.min.x < self.max.x
        && self.min.y < other.max.y && other.min.y < self.max.y
        && self.min.z < other.max.z && other.min.z < self.max.z
    }

    /// Test if `other` lies entirely inside this box.
    ///
    /// Every point of `other` is then a point of `self`, which is what
    /// allows a range query to take a node's contents without testing them.
    #[inline]
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && other.max.x <= self.max.x
        && self.min.y <= other.min.y && other.max.y <= self.max.y
        && self.min.z <= other.min.z && other.max.z <= self.max.z
    }

    /// Octant code of `point` relative to this box's partition.
    #[inline]
    pub fn octant_of(&self, point: Vec3) -> u8 {
        octant_around(self.partition(), point)
    }

    /// Sub-box covering octant `octant` of this box.
    pub fn octant_bounds(&self, octant: u8) -> AABB {
        self.split_at(self.partition(), octant)
    }

    /// Sub-box covering octant `octant` when the box is split at `partition`.
    ///
    /// `partition` must lie inside the box. Octree nodes grown around an
    /// existing root split at the old root's face rather than at their
    /// midpoint, so the split point is explicit here.
    pub fn split_at(&self, partition: Vec3, octant: u8) -> AABB {
        let pick = |bit: u8, low: (f32, f32), high: (f32, f32)| {
            if octant & bit == 0 { low } else { high }
        };

        let (min_x, max_x) = pick(OCTANT_POS_X, (self.min.x, partition.x), (partition.x, self.max.x));
        let (min_y, max_y) = pick(OCTANT_POS_Y, (self.min.y, partition.y), (partition.y, self.max.y));
        let (min_z, max_z) = pick(OCTANT_POS_Z, (self.min.z, partition.z), (partition.z, self.max.z));

        AABB {
            min: Vec3::new(min_x, min_y, min_z),
            max: Vec3::new(max_x, max_y, max_z),
        }
    }

    /// Box of twice the size that keeps this box as its corner opposite
    /// `octant`, extending toward `octant` on every axis.
    ///
    /// Returns `None` when the grown box can no longer be represented
    /// (a coordinate or the edge length overflows `f32`).
    pub fn grow_toward(&self, octant: u8) -> Option<AABB> {
        let offset = octant_direction(octant) * self.size();
        let grown = AABB {
            min: self.min.min(self.min + offset),
            max: self.max.max(self.max + offset),
        };

        if grown.min.is_finite() && grown.max.is_finite() && grown.size().is_finite() {
            Some(grown)
        } else {
            None
        }
    }

    /// Corner of the box lying in the direction of `octant`.
    ///
    /// A set bit picks the max face on that axis, a clear bit the min face.
    pub fn corner(&self, octant: u8) -> Vec3 {
        Vec3::new(
            if octant & OCTANT_POS_X == 0 { self.min.x } else { self.max.x },
            if octant & OCTANT_POS_Y == 0 { self.min.y } else { self.max.y },
            if octant & OCTANT_POS_Z == 0 { self.min.z } else { self.max.z },
        )
    }
}

/// Octant code of `point` relative to `partition`.
///
/// Points exactly on a partition plane go to the upper side, matching the
/// half-open `[partition, max)` bounds of the upper child.
#[inline]
pub fn octant_around(partition: Vec3, point: Vec3) -> u8 {
    (((point.z >= partition.z) as u8) * OCTANT_POS_Z)
        | (((point.y >= partition.y) as u8) * OCTANT_POS_Y)
        | (((point.x >= partition.x) as u8) * OCTANT_POS_X)
}

/// Unit direction (+1/-1 per axis) pointing into octant `octant`.
#[inline]
pub fn octant_direction(octant: u8) -> Vec3 {
    Vec3::new(
        if octant & OCTANT_POS_X == 0 { -1.0 } else { 1.0 },
        if octant & OCTANT_POS_Y == 0 { -1.0 } else { 1.0 },
        if octant & OCTANT_POS_Z == 0 { -1.0 } else { 1.0 },
    )
}

/// Octant on the opposite side of the partition on every axis.
#[inline]
pub fn opposite_octant(octant: u8) -> u8 {
    !octant & 0b111
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
