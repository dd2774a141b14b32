//! Octree nodes and the arena that owns them.
//!
//! Nodes live in a flat `Vec` and reference each other by index: children
//! through 8 sparse slots, the parent through a plain back-index used only
//! for upward walks. Nodes are never freed; an emptied node stays as an
//! empty leaf until the arena is cleared.
//!
//! Every node's `elements` map holds **all** elements of its subtree, not
//! just the ones stored at a leaf. The root map is therefore the complete
//! set of tracked elements, and a node fully inside a query range can be
//! emitted without visiting its descendants.

use std::fmt::Debug;
use std::hash::Hash;
use glam::Vec3;
use rustc_hash::FxHashMap;
use super::aabb::{octant_around, opposite_octant, AABB, OCTANT_COUNT};

/// Source tag used in log entries
const LOG_SOURCE: &str = "galaxy3d::Octree";

/// A single node of the dynamic octree.
pub(crate) struct OctreeNode<T> {
    /// Half-open bounds of this node
    pub(crate) bounds: AABB,
    /// Split point between the 8 octants (midpoint, except for grown roots)
    pub(crate) partition: Vec3,
    /// Every element of this subtree with its position
    pub(crate) elements: FxHashMap<T, Vec3>,
    /// Child node indices by octant code (None = never populated)
    pub(crate) children: [Option<usize>; OCTANT_COUNT],
    /// Parent node index (None for the current root)
    pub(crate) parent: Option<usize>,
}

impl<T> OctreeNode<T> {
    fn new(bounds: AABB, partition: Vec3, parent: Option<usize>) -> Self {
        Self {
            bounds,
            partition,
            elements: FxHashMap::default(),
            children: [None; OCTANT_COUNT],
            parent,
        }
    }

    /// Octant of `position` relative to this node's partition
    #[inline]
    pub(crate) fn octant_of(&self, position: Vec3) -> u8 {
        octant_around(self.partition, position)
    }

    /// Indices of all allocated children
    pub(crate) fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().flatten().copied()
    }
}

/// Arena holding every node of one octree plus the current root index.
///
/// All methods assume the caller holds the octree lock; the arena itself
/// does no synchronization.
pub(crate) struct NodeArena<T> {
    /// Flat node storage, indexed by node id
    pub(crate) nodes: Vec<OctreeNode<T>>,
    /// Index of the current root (changes when the tree grows)
    pub(crate) root: usize,
    /// Nodes whose edge is not above this size are never subdivided
    minimum_node_size: f32,
    /// Bounds of the root at construction, restored by `clear`
    initial_bounds: AABB,
}

impl<T> NodeArena<T>
where
    T: Eq + Hash + Clone + Debug,
{
    /// Create an arena with a single empty root covering `bounds`.
    pub(crate) fn new(bounds: AABB, minimum_node_size: f32) -> Self {
        Self {
            nodes: vec![OctreeNode::new(bounds, bounds.partition(), None)],
            root: 0,
            minimum_node_size,
            initial_bounds: bounds,
        }
    }

    // ===== READ ACCESS =====

    /// The current root node
    #[inline]
    pub(crate) fn root_node(&self) -> &OctreeNode<T> {
        &self.nodes[self.root]
    }

    /// Number of tracked elements
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.root_node().elements.len()
    }

    /// Current position of `element`, if tracked
    #[inline]
    pub(crate) fn position_of(&self, element: &T) -> Option<Vec3> {
        self.root_node().elements.get(element).copied()
    }

    /// A node is a leaf when none of its children hold elements.
    pub(crate) fn is_leaf(&self, node: usize) -> bool {
        self.nodes[node]
            .child_indices()
            .all(|child| self.nodes[child].elements.is_empty())
    }

    // ===== STRUCTURE =====

    fn alloc(&mut self, node: OctreeNode<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Child of `node` in `octant`, created on first use.
    fn child_or_create(&mut self, node: usize, octant: u8) -> usize {
        if let Some(child) = self.nodes[node].children[octant as usize] {
            return child;
        }

        let parent = &self.nodes[node];
        let bounds = parent.bounds.split_at(parent.partition, octant);
        let child = self.alloc(OctreeNode::new(bounds, bounds.partition(), Some(node)));
        self.nodes[node].children[octant as usize] = Some(child);
        child
    }

    /// Octant of `bounds` the root grows toward to approach `position`.
    ///
    /// Picks the corner nearest to `position` axis by axis, against the
    /// box midpoint. Points on the midpoint go to the upper side.
    fn growth_octant(bounds: &AABB, position: Vec3) -> u8 {
        octant_around(bounds.partition(), position)
    }

    /// Whether the root can grow to contain `position` without its bounds
    /// overflowing `f32`. Walks the growth steps without touching the tree.
    pub(crate) fn can_grow_to(&self, position: Vec3) -> bool {
        if !position.is_finite() {
            return false;
        }

        let mut bounds = self.root_node().bounds;
        while !bounds.contains_point(position) {
            match bounds.grow_toward(Self::growth_octant(&bounds, position)) {
                Some(grown) => bounds = grown,
                None => return false,
            }
        }
        true
    }

    /// Replace the root with larger parents until it contains `position`.
    ///
    /// Each step doubles the root toward the corner nearest to `position`.
    /// The old root becomes the new parent's child in the opposite octant,
    /// and the new parent starts with a copy of the old root's map.
    ///
    /// Callers check `can_grow_to(position)` first; growth that would
    /// overflow stops early and leaves the root short of `position`.
    /// Returns the number of growth steps.
    pub(crate) fn grow_to_contain(&mut self, position: Vec3) -> u32 {
        let mut steps = 0;
        while !self.root_node().bounds.contains_point(position) {
            let old_root = self.root;
            let bounds = self.nodes[old_root].bounds;
            let toward = Self::growth_octant(&bounds, position);

            let grown = match bounds.grow_toward(toward) {
                Some(grown) => grown,
                None => {
                    crate::spatial_error!(
                        LOG_SOURCE,
                        "Root bounds {:?}..{:?} cannot grow toward {:?}",
                        bounds.min,
                        bounds.max,
                        position
                    );
                    break;
                }
            };
            // Split exactly on the old root's face so it keeps its bounds
            let partition = bounds.corner(toward);

            let mut parent = OctreeNode::new(grown, partition, None);
            parent.elements = self.nodes[old_root].elements.clone();
            parent.children[opposite_octant(toward) as usize] = Some(old_root);

            let new_root = self.alloc(parent);
            self.nodes[old_root].parent = Some(new_root);
            self.root = new_root;
            steps += 1;
        }

        if steps > 0 {
            crate::spatial_debug!(
                LOG_SOURCE,
                "Root grew {} step(s) to {:?}..{:?} to contain {:?}",
                steps,
                self.root_node().bounds.min,
                self.root_node().bounds.max,
                position
            );
        }

        steps
    }

    // ===== INSERTION =====

    /// Record `element` at `position` in `anchor` and every node below it
    /// down to the owning leaf, then rebalance that leaf.
    ///
    /// `anchor` must contain `position` and its subtree must not already
    /// hold `element`. Ancestors above `anchor` are left to the caller.
    pub(crate) fn insert_from(&mut self, anchor: usize, position: Vec3, element: T) {
        debug_assert!(self.nodes[anchor].bounds.contains_point(position));

        let mut node = anchor;
        loop {
            self.nodes[node].elements.insert(element.clone(), position);
            if self.is_leaf(node) {
                break;
            }
            let octant = self.nodes[node].octant_of(position);
            node = self.child_or_create(node, octant);
        }

        self.rebalance(node);
    }

    /// Subdivide `leaf` and the children it produces while that separates
    /// elements.
    fn rebalance(&mut self, leaf: usize) {
        let mut worklist = vec![leaf];

        while let Some(node) = worklist.pop() {
            if !self.should_subdivide(node) {
                continue;
            }

            let entries: Vec<(T, Vec3)> = self.nodes[node]
                .elements
                .iter()
                .map(|(element, position)| (element.clone(), *position))
                .collect();

            let mut populated = [None; OCTANT_COUNT];
            for (element, position) in entries {
                let octant = self.nodes[node].octant_of(position);
                let child = self.child_or_create(node, octant);
                self.nodes[child].elements.insert(element, position);
                populated[octant as usize] = Some(child);
            }

            crate::spatial_trace!(
                LOG_SOURCE,
                "Subdivided node {} ({} elements, edge {})",
                node,
                self.nodes[node].elements.len(),
                self.nodes[node].bounds.edge_length()
            );
            worklist.extend(populated.iter().flatten().copied());
        }
    }

    /// A leaf splits when it holds 2+ elements, is larger than the minimum
    /// node size, and its elements do not all share one octant.
    fn should_subdivide(&self, node: usize) -> bool {
        let n = &self.nodes[node];
        if n.elements.len() < 2 || n.bounds.edge_length() <= self.minimum_node_size {
            return false;
        }

        let mut octants = n.elements.values().map(|position| n.octant_of(*position));
        match octants.next() {
            Some(first) => octants.any(|octant| octant != first),
            None => false,
        }
    }

    // ===== LOOKUP AND REMOVAL =====

    /// Leaf currently holding `element`, found by descending from the root
    /// through child membership.
    ///
    /// # Panics
    ///
    /// Panics if a non-leaf node tracks the element but its routed child
    /// does not (ancestor and descendant bookkeeping disagree).
    pub(crate) fn locate_leaf(&self, element: &T) -> Option<usize> {
        let position = self.position_of(element)?;

        let mut node = self.root;
        loop {
            match self.routed_child_holding(node, position, element) {
                Some(child) => node = child,
                None => {
                    if !self.is_leaf(node) {
                        self.corrupted(node, element);
                    }
                    return Some(node);
                }
            }
        }
    }

    /// Remove `element` from `anchor` and every node below it that holds it.
    ///
    /// # Panics
    ///
    /// Panics on ancestor/descendant disagreement, like `locate_leaf`.
    pub(crate) fn detach(&mut self, anchor: usize, element: &T) {
        let mut node = anchor;
        while let Some(position) = self.nodes[node].elements.remove(element) {
            match self.routed_child_holding(node, position, element) {
                Some(child) => node = child,
                None => {
                    if !self.is_leaf(node) {
                        self.corrupted(node, element);
                    }
                    break;
                }
            }
        }
    }

    /// Remove `element` from the whole tree. Returns false if untracked.
    pub(crate) fn remove(&mut self, element: &T) -> bool {
        if !self.root_node().elements.contains_key(element) {
            return false;
        }
        self.detach(self.root, element);
        true
    }

    /// Move a tracked `element` to `new_position`.
    ///
    /// Finds the element's leaf, walks up the parent chain to the first
    /// node containing `new_position`, detaches the element below that
    /// anchor and re-inserts it from there. Nodes above the anchor keep
    /// the element and only see its position change. When even the root
    /// does not contain `new_position`, the element is re-inserted from a
    /// grown root.
    ///
    /// Returns false if `element` is not tracked.
    pub(crate) fn relocate(&mut self, element: &T, new_position: Vec3) -> bool {
        let old_position = match self.position_of(element) {
            Some(position) => position,
            None => return false,
        };
        if old_position == new_position {
            return true;
        }

        let mut anchor = match self.locate_leaf(element) {
            Some(leaf) => leaf,
            None => return false,
        };
        while !self.nodes[anchor].bounds.contains_point(new_position) {
            match self.nodes[anchor].parent {
                Some(parent) => anchor = parent,
                None => break,
            }
        }

        if self.nodes[anchor].bounds.contains_point(new_position) {
            self.detach(anchor, element);

            let mut above = self.nodes[anchor].parent;
            while let Some(node) = above {
                self.nodes[node].elements.insert(element.clone(), new_position);
                above = self.nodes[node].parent;
            }

            self.insert_from(anchor, new_position, element.clone());
        } else {
            self.detach(self.root, element);
            self.grow_to_contain(new_position);
            self.insert_from(self.root, new_position, element.clone());
        }

        true
    }

    /// Child of `node` that the element's position routes to, if it
    /// tracks the element.
    fn routed_child_holding(&self, node: usize, position: Vec3, element: &T) -> Option<usize> {
        let octant = self.nodes[node].octant_of(position);
        self.nodes[node].children[octant as usize]
            .filter(|&child| self.nodes[child].elements.contains_key(element))
    }

    #[cold]
    fn corrupted(&self, node: usize, element: &T) -> ! {
        crate::spatial_error!(
            LOG_SOURCE,
            "Index corrupted: node {} tracks {:?} but none of its children do",
            node,
            element
        );
        panic!("octree index corrupted: node {} tracks {:?} but none of its children do", node, element);
    }

    // ===== QUERY =====

    /// Emit every element whose position lies in `range` exactly once.
    ///
    /// Depth-first with an explicit stack. A node fully inside the range is
    /// emitted wholesale from its map; a partially overlapping leaf has its
    /// points tested one by one.
    pub(crate) fn query<R, F>(&self, range: &AABB, mut projection: F, results: &mut Vec<R>)
    where
        F: FnMut(Vec3, &T) -> R,
    {
        let mut stack = vec![self.root];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.elements.is_empty() || !node.bounds.intersects(range) {
                continue;
            }

            if range.contains(&node.bounds) {
                results.extend(
                    node.elements
                        .iter()
                        .map(|(element, position)| projection(*position, element)),
                );
            } else if !self.is_leaf(index) {
                stack.extend(node.child_indices());
            } else {
                results.extend(
                    node.elements
                        .iter()
                        .filter(|(_, position)| range.contains_point(**position))
                        .map(|(element, position)| projection(*position, element)),
                );
            }
        }
    }

    /// Drop every node and restore a single empty root at the initial bounds.
    pub(crate) fn clear(&mut self) {
        let bounds = self.initial_bounds;
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(bounds, bounds.partition(), None));
        self.root = 0;
    }
}
