//! OctreeLock - scoped proof that the caller holds an octree's mutex.

use std::fmt;
use std::sync::MutexGuard;
use super::octree::Octree;
use super::octree_node::NodeArena;

/// Exclusive access to one [`Octree`], released when dropped.
///
/// Obtained from [`Octree::acquire_lock`] or [`Octree::try_acquire_lock`]
/// and passed to every octree operation. Holding one guard across several
/// calls makes them atomic with respect to other threads:
///
/// ```ignore
/// let mut lock = octree.acquire_lock()?;
/// octree.remove(&mut lock, &old_id);
/// octree.add(&mut lock, position, new_id)?;
/// // other threads see both changes or neither
/// drop(lock);
/// ```
pub struct OctreeLock<'a, T> {
    /// Octree this guard was issued by
    pub(crate) owner: &'a Octree<T>,
    /// The locked node arena
    pub(crate) arena: MutexGuard<'a, NodeArena<T>>,
}

impl<'a, T> OctreeLock<'a, T> {
    pub(crate) fn new(owner: &'a Octree<T>, arena: MutexGuard<'a, NodeArena<T>>) -> Self {
        Self { owner, arena }
    }

    /// Whether this guard was issued by `octree`
    #[inline]
    pub fn is_for(&self, octree: &Octree<T>) -> bool {
        std::ptr::eq(self.owner, octree)
    }
}

impl<T> fmt::Debug for OctreeLock<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctreeLock")
            .field("owner", &(self.owner as *const Octree<T>))
            .finish()
    }
}
