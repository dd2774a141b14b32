//! Octree - dynamic, self-growing spatial index for point-positioned elements.
//!
//! Tracks a changing set of distinct elements (entity ids, handles...) by
//! position and answers half-open box range queries.
//!
//! - **Unbounded**: the root grows toward any position outside its bounds,
//!   so no world extent is needed up front.
//! - **Lazy subdivision**: a leaf only splits when its elements actually
//!   spread over more than one octant, down to `minimum_node_size`.
//! - **Explicit locking**: every operation takes an [`OctreeLock`] obtained
//!   from the octree, so the lock requirement is visible at each call site
//!   and several operations can share one critical section.
//!
//! # Example
//!
//! ```ignore
//! use galaxy_3d_spatial::galaxy3d::spatial::{Octree, OctreeConfig};
//! use glam::Vec3;
//!
//! let octree = Octree::new(OctreeConfig::default())?;
//! let mut lock = octree.acquire_lock()?;
//!
//! octree.add(&mut lock, Vec3::new(1.0, 0.0, 2.0), 42u32)?;
//! octree.update_position(&mut lock, &42, Vec3::new(500.0, 0.0, 0.0))?;
//!
//! let mut hits = Vec::new();
//! octree.get_elements_in_range(
//!     &lock,
//!     Vec3::new(400.0, -100.0, -100.0),
//!     Vec3::new(600.0, 100.0, 100.0),
//!     |position, id| (*id, position),
//!     &mut hits,
//! );
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, TryLockError};
use glam::Vec3;
use crate::error::{Error, Result};
use super::aabb::AABB;
use super::octree_config::OctreeConfig;
use super::octree_lock::OctreeLock;
use super::octree_node::NodeArena;

/// Source tag used in log entries
const LOG_SOURCE: &str = "galaxy3d::Octree";

/// Dynamic octree spatial index.
///
/// `T` is the element type and is used as a hash map key: each distinct
/// element is tracked at most once. The `Debug` bound is only used to name
/// the element in error values and log messages.
pub struct Octree<T> {
    /// Construction parameters (immutable)
    config: OctreeConfig,
    /// Node arena and root index, guarded by one coarse mutex
    arena: Mutex<NodeArena<T>>,
}

impl<T> Octree<T>
where
    T: Eq + Hash + Clone + Debug,
{
    /// Log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::ElementNotFound(msg) => {
                crate::spatial_warn!(LOG_SOURCE, "Element not found: {}", msg);
            }
            _ => {
                crate::spatial_error!(LOG_SOURCE, "Octree error: {}", error);
            }
        }
        error
    }

    /// Create an empty octree.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` fails validation.
    pub fn new(config: OctreeConfig) -> Result<Self> {
        config.validate().map_err(Self::log_and_return_error)?;

        let bounds = config.initial_bounds();
        crate::spatial_debug!(
            LOG_SOURCE,
            "Created octree: bounds {:?}..{:?}, minimum node size {}",
            bounds.min,
            bounds.max,
            config.minimum_node_size
        );

        Ok(Self {
            config,
            arena: Mutex::new(NodeArena::new(bounds, config.minimum_node_size)),
        })
    }

    /// Create an octree pre-populated with `elements`.
    ///
    /// Each pair goes through the regular locked [`add`](Self::add) path;
    /// a repeated element ends up at its last listed position.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for a bad config and
    /// `Error::InvalidPosition` for a non-finite position.
    pub fn with_elements<I>(config: OctreeConfig, elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, Vec3)>,
    {
        let octree = Self::new(config)?;
        {
            let mut lock = octree.acquire_lock()?;
            for (element, position) in elements {
                octree.add(&mut lock, position, element)?;
            }
        }
        Ok(octree)
    }

    /// Construction parameters
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Smallest edge length a node may be subdivided to
    pub fn minimum_node_size(&self) -> f32 {
        self.config.minimum_node_size
    }

    // ===== LOCKING =====

    /// Block until the octree lock is available.
    ///
    /// # Errors
    ///
    /// Returns `Error::LockPoisoned` if an operation panicked while holding
    /// the lock; the index must then be considered corrupted.
    pub fn acquire_lock(&self) -> Result<OctreeLock<'_, T>> {
        let guard = self.arena.lock()
            .map_err(|_| Self::log_and_return_error(Error::LockPoisoned))?;
        Ok(OctreeLock::new(self, guard))
    }

    /// Take the octree lock if it is free, without blocking.
    ///
    /// Returns `Ok(None)` when another guard is alive.
    ///
    /// # Errors
    ///
    /// Returns `Error::LockPoisoned` like [`acquire_lock`](Self::acquire_lock).
    pub fn try_acquire_lock(&self) -> Result<Option<OctreeLock<'_, T>>> {
        match self.arena.try_lock() {
            Ok(guard) => Ok(Some(OctreeLock::new(self, guard))),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Poisoned(_)) => Err(Self::log_and_return_error(Error::LockPoisoned)),
        }
    }

    /// Panics if `lock` was issued by another octree.
    #[inline]
    fn check_lock(&self, lock: &OctreeLock<'_, T>) {
        assert!(lock.is_for(self), "OctreeLock used with an octree that did not issue it");
    }

    // ===== MUTATION =====

    /// Insert `element` at `position`, or move it there if already tracked.
    ///
    /// The root grows as needed; the owning leaf is subdivided if the new
    /// element separates its contents into several octants.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPosition` if `position` has a NaN or infinite
    /// coordinate, or lies so far out that the root bounds would overflow
    /// `f32` before containing it. The octree is left unchanged.
    pub fn add(&self, lock: &mut OctreeLock<'_, T>, position: Vec3, element: T) -> Result<()> {
        self.check_lock(lock);
        Self::check_position(position)?;
        Self::check_reachable(&lock.arena, position)?;

        let arena = &mut *lock.arena;
        if arena.relocate(&element, position) {
            return Ok(());
        }

        arena.grow_to_contain(position);
        let root = arena.root;
        arena.insert_from(root, position, element);
        Ok(())
    }

    /// Move a tracked `element` to `new_position`.
    ///
    /// Moving an element to the position it already has is a no-op.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidPosition` if `new_position` is not finite or out of
    ///   reach of root growth
    /// - `Error::ElementNotFound` if `element` is not tracked
    pub fn update_position(
        &self,
        lock: &mut OctreeLock<'_, T>,
        element: &T,
        new_position: Vec3,
    ) -> Result<()> {
        self.check_lock(lock);
        Self::check_position(new_position)?;
        Self::check_reachable(&lock.arena, new_position)?;

        if lock.arena.relocate(element, new_position) {
            Ok(())
        } else {
            Err(Self::log_and_return_error(Error::ElementNotFound(format!("{:?}", element))))
        }
    }

    /// Stop tracking `element`. Returns false if it was not tracked.
    ///
    /// Emptied nodes are kept; they are reused by later inserts.
    pub fn remove(&self, lock: &mut OctreeLock<'_, T>, element: &T) -> bool {
        self.check_lock(lock);
        lock.arena.remove(element)
    }

    /// Remove every element and shrink back to the initial root bounds.
    pub fn clear(&self, lock: &mut OctreeLock<'_, T>) {
        self.check_lock(lock);
        let (elements, nodes) = (lock.arena.len(), lock.arena.nodes.len());
        lock.arena.clear();
        crate::spatial_info!(
            LOG_SOURCE,
            "Cleared octree: dropped {} element(s) and {} node(s)",
            elements,
            nodes
        );
    }

    // ===== QUERIES =====

    /// Collect every element whose position lies in `[min, max)`.
    ///
    /// Each match is passed through `projection(position, &element)` and
    /// the result appended to `results`. Every matching element is emitted
    /// exactly once; order is unspecified.
    pub fn get_elements_in_range<R, F>(
        &self,
        lock: &OctreeLock<'_, T>,
        min: Vec3,
        max: Vec3,
        projection: F,
        results: &mut Vec<R>,
    ) where
        F: FnMut(Vec3, &T) -> R,
    {
        self.check_lock(lock);
        lock.arena.query(&AABB::new(min, max), projection, results);
    }

    /// Number of tracked elements
    pub fn count(&self, lock: &OctreeLock<'_, T>) -> usize {
        self.check_lock(lock);
        lock.arena.len()
    }

    /// Whether `element` is tracked
    pub fn contains(&self, lock: &OctreeLock<'_, T>, element: &T) -> bool {
        self.check_lock(lock);
        lock.arena.position_of(element).is_some()
    }

    /// Current position of `element`
    ///
    /// # Errors
    ///
    /// Returns `Error::ElementNotFound` if `element` is not tracked.
    pub fn position_of(&self, lock: &OctreeLock<'_, T>, element: &T) -> Result<Vec3> {
        self.check_lock(lock);
        lock.arena.position_of(element)
            .ok_or_else(|| Self::log_and_return_error(Error::ElementNotFound(format!("{:?}", element))))
    }

    /// Current root bounds (grows over time, never shrinks except on clear)
    pub fn bounds(&self, lock: &OctreeLock<'_, T>) -> AABB {
        self.check_lock(lock);
        lock.arena.root_node().bounds
    }

    /// Number of allocated nodes, empty ones included
    pub fn node_count(&self, lock: &OctreeLock<'_, T>) -> usize {
        self.check_lock(lock);
        lock.arena.nodes.len()
    }

    /// Rejects positions the root cannot grow to contain.
    fn check_reachable(arena: &NodeArena<T>, position: Vec3) -> Result<()> {
        if arena.can_grow_to(position) {
            Ok(())
        } else {
            Err(Self::log_and_return_error(Error::InvalidPosition(format!(
                "{:?} is beyond the representable octree extent", position
            ))))
        }
    }

    fn check_position(position: Vec3) -> Result<()> {
        if position.is_finite() {
            Ok(())
        } else {
            Err(Self::log_and_return_error(Error::InvalidPosition(format!("{:?}", position))))
        }
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
