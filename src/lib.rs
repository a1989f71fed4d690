//! An arena-backed AVL tree augmented with subtree counts.
//!
//! Every node carries, next to its payload, the height and the number of
//! nodes of its subtree. The height drives the usual AVL rebalancing; the
//! count turns the tree into an order-statistics structure, so
//! [`AvlTree::offset`] can move a logical position by a signed number of
//! places in sorted order in O(log n), no matter how large the jump.
//!
//! The tree itself is deliberately ignorant of keys. It stores nodes in a
//! growable arena and hands out [`NodeId`]s; an embedding collection (such as
//! [`RankMap`]) supplies the total order by walking the links itself and
//! calling [`AvlTree::insert_root`] or [`AvlTree::insert_under`] once it has
//! found the empty slot for a new node. Rebalancing, deletion and rank
//! navigation are entirely structural and never look at payloads.

// Conventions used in comments:
// - h(x) is the height of the subtree rooted at x; a leaf has h = 1 and a
//   missing child has h = 0.
// - c(x) is the number of nodes in the subtree rooted at x; a missing child
//   has c = 0.
//
// The invariants restored after every mutation are:
// 1. h(x) = 1 + max(h(left), h(right))
// 2. c(x) = 1 + c(left) + c(right)
// 3. |h(left) - h(right)| <= 1
//
// (3) bounds the height at ~1.44*log2(n + 2), which in turn bounds every
// operation here.

use core::ops::Not;

mod arena;
mod cursor;
mod debug;
mod iter;
mod map;
#[cfg(any(test, feature = "model"))]
pub mod model;
#[cfg(test)]
mod tests;

pub use arena::NodeId;
pub use cursor::{Cursor, CursorMut};
pub use iter::Iter;
pub use map::{Entries, RankMap};

use arena::Arena;

/// Selects one of a node's two child slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

struct Node<T> {
    parent: Option<NodeId>,
    children: [Option<NodeId>; 2],
    height: u32,
    count: u32,
    item: T,
}

impl<T> Node<T> {
    fn new(item: T) -> Node<T> {
        Node {
            parent: None,
            children: [None; 2],
            height: 1,
            count: 1,
            item,
        }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Option<NodeId> {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Option<NodeId> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Option<NodeId> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Option<NodeId>) {
        self.children[dir as usize] = child;
    }
}

/// An AVL tree whose nodes live in a stable arena and reference each other
/// by [`NodeId`].
///
/// The parent link is an index lookup rather than an ownership relation, so
/// upward traversal costs O(1) without any aliasing or cycle hazards.
pub struct AvlTree<T> {
    arena: Arena<Node<T>>,
    root: Option<NodeId>,
}

impl<T> AvlTree<T> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Returns a new empty tree with room for `capacity` nodes before the
    /// arena reallocates.
    pub fn with_capacity(capacity: usize) -> AvlTree<T> {
        AvlTree {
            arena: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of nodes in the tree.
    ///
    /// This is the root's subtree count, read in O(1).
    pub fn len(&self) -> usize {
        self.root.map(|root| self.node(root).count as usize).unwrap_or(0)
    }

    /// Returns `true` if the tree contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns a reference to the payload of `node`.
    pub fn get(&self, node: NodeId) -> &T {
        &self.arena.get(node).item
    }

    /// Returns a mutable reference to the payload of `node`.
    ///
    /// Payload mutation must not change the node's position in whatever
    /// order the embedding collection maintains.
    pub fn get_mut(&mut self, node: NodeId) -> &mut T {
        &mut self.arena.get_mut(node).item
    }

    /// Returns the parent of `node`.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Returns the `dir` child of `node`.
    pub fn child(&self, node: NodeId, dir: Dir) -> Option<NodeId> {
        self.node(node).child(dir)
    }

    /// Returns the left child of `node`.
    pub fn left(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).left()
    }

    /// Returns the right child of `node`.
    pub fn right(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).right()
    }

    /// Returns the height of the subtree rooted at `node`. A leaf has
    /// height 1.
    pub fn height(&self, node: NodeId) -> u32 {
        self.node(node).height
    }

    /// Returns the number of nodes in the subtree rooted at `node`,
    /// including `node` itself.
    pub fn count(&self, node: NodeId) -> u32 {
        self.node(node).count
    }

    /// Returns the minimum node of the tree.
    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.extremum(root, Dir::Left))
    }

    /// Returns the maximum node of the tree.
    pub fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.extremum(root, Dir::Right))
    }

    /// Returns the in-order successor of `node`.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.step(node, Dir::Right)
    }

    /// Returns the in-order predecessor of `node`.
    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        self.step(node, Dir::Left)
    }

    /// Inserts `item` as the root of an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if the tree is not empty.
    pub fn insert_root(&mut self, item: T) -> NodeId {
        assert!(self.root.is_none(), "insert_root on a non-empty tree");

        let node = self.arena.alloc(Node::new(item));
        self.root = Some(node);
        node
    }

    /// Inserts `item` into the empty `dir` child slot of `parent` and
    /// rebalances upward from the new node.
    ///
    /// The caller has already decided where the item belongs; this method
    /// only links it in and restores the tree invariants.
    ///
    /// # Panics
    ///
    /// Panics if `parent` already has a `dir` child.
    pub fn insert_under(&mut self, parent: NodeId, dir: Dir, item: T) -> NodeId {
        assert!(
            self.node(parent).child(dir).is_none(),
            "insert_under requires an empty child slot",
        );

        let node = self.arena.alloc(Node::new(item));
        self.node_mut(node).parent = Some(parent);
        self.node_mut(parent).set_child(dir, Some(node));
        self.root = Some(self.rebalance(node));
        node
    }

    /// Removes `node` from the tree and returns its payload.
    ///
    /// The relative order of the remaining nodes is preserved. The node's
    /// arena slot is freed before returning, so its id (and any stale links
    /// it held) cannot leak into a later tree.
    pub fn remove(&mut self, node: NodeId) -> T {
        self.root = self.detach(node);
        self.arena.take(node).item
    }

    /// Returns the node `offset` places away from `node` in sorted order.
    ///
    /// An offset of 0 returns `node` itself; negative offsets move toward
    /// predecessors. Returns `None` if the offset runs past either end of
    /// the tree.
    ///
    /// The walk alternates bounded descents and ascents steered by the
    /// subtree counts, so it costs O(log n) regardless of the magnitude of
    /// `offset`.
    pub fn offset(&self, node: NodeId, offset: i64) -> Option<NodeId> {
        let mut node = node;
        // Position of `node` relative to the starting node.
        let mut pos: i64 = 0;

        while pos != offset {
            let left = self.node(node).left();
            let right = self.node(node).right();

            if pos < offset && pos + i64::from(self.count_of(right)) >= offset {
                // The target is inside the right subtree.
                node = right.expect("a positive subtree count implies a child");
                pos += i64::from(self.count_of(self.node(node).left())) + 1;
            } else if pos > offset && pos - i64::from(self.count_of(left)) <= offset {
                // The target is inside the left subtree.
                node = left.expect("a positive subtree count implies a child");
                pos -= i64::from(self.count_of(self.node(node).right())) + 1;
            } else {
                // Not under this node; go up. Running off the root means the
                // offset is out of range.
                let parent = self.node(node).parent?;
                if self.node(parent).right() == Some(node) {
                    pos -= i64::from(self.count_of(left)) + 1;
                } else {
                    pos += i64::from(self.count_of(right)) + 1;
                }
                node = parent;
            }
        }

        Some(node)
    }

    /// Returns a borrowed in-order iterator over the tree's payloads.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor over the tree, positioned on the first node.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::first(self)
    }

    /// Returns a cursor over the tree, positioned on the last node.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::last(self)
    }

    /// Returns an editing cursor over the tree, positioned on the first node.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::first(self)
    }

    /// Returns an editing cursor over the tree, positioned on the last node.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::last(self)
    }

    /// Removes every node from the tree.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        match self.root {
            Some(root) => {
                assert_eq!(self.node(root).parent, None, "root must not have a parent");
                self.assert_invariants_at(root);
            }
            None => assert!(self.arena.is_empty(), "empty tree with occupied arena slots"),
        }

        assert_eq!(self.len(), self.arena.len(), "root count out of sync with arena");
    }

    fn assert_invariants_at(&self, node: NodeId) -> (u32, u32) {
        let mut heights = [0u32; 2];
        let mut counts = [0u32; 2];

        for dir in [Dir::Left, Dir::Right] {
            if let Some(child) = self.node(node).child(dir) {
                assert_eq!(
                    self.node(child).parent,
                    Some(node),
                    "child's parent link does not point back",
                );

                let (height, count) = self.assert_invariants_at(child);
                heights[dir as usize] = height;
                counts[dir as usize] = count;
            }
        }

        let [l, r] = heights;
        assert!(l.abs_diff(r) <= 1, "balance factor out of range");

        let height = 1 + l.max(r);
        let count = 1 + counts[0] + counts[1];
        assert_eq!(self.node(node).height, height, "stale height");
        assert_eq!(self.node(node).count, count, "stale count");

        (height, count)
    }

    // Support methods ========================================================

    #[inline]
    fn node(&self, id: NodeId) -> &Node<T> {
        self.arena.get(id)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.arena.get_mut(id)
    }

    #[inline]
    fn height_of(&self, link: Option<NodeId>) -> u32 {
        link.map(|id| self.node(id).height).unwrap_or(0)
    }

    #[inline]
    fn count_of(&self, link: Option<NodeId>) -> u32 {
        link.map(|id| self.node(id).count).unwrap_or(0)
    }

    pub(crate) fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.node(parent).left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.node(parent).right(), Some(child));
            Dir::Right
        }
    }

    /// Descends from `from` along `dir` children to the end of the subtree.
    fn extremum(&self, from: NodeId, dir: Dir) -> NodeId {
        let mut cur = from;
        while let Some(child) = self.node(cur).child(dir) {
            cur = child;
        }
        cur
    }

    /// One in-order step in direction `dir`.
    fn step(&self, node: NodeId, dir: Dir) -> Option<NodeId> {
        if let Some(child) = self.node(node).child(dir) {
            return Some(self.extremum(child, !dir));
        }

        let mut cur = node;
        loop {
            let parent = self.node(cur).parent?;
            let from = self.which_child(parent, cur);
            cur = parent;
            if from != dir {
                return Some(cur);
            }
        }
    }

    /// Refreshes `node`'s height and count from its children.
    fn update(&mut self, node: NodeId) {
        let l = self.node(node).left();
        let r = self.node(node).right();
        let height = 1 + self.height_of(l).max(self.height_of(r));
        let count = 1 + self.count_of(l) + self.count_of(r);

        let node = self.node_mut(node);
        node.height = height;
        node.count = count;
    }

    /// Rotates the subtree rooted at `node` toward `dir`, promoting the
    /// child on the opposite side to the subtree root.
    ///
    /// The in-order sequence is unchanged and the two rotated nodes are
    /// re-augmented. The new subtree root inherits `node`'s parent link, but
    /// the parent's child slot still names `node`; reattachment is the
    /// caller's job.
    fn rotate(&mut self, node: NodeId, dir: Dir) -> NodeId {
        let up = self
            .node(node)
            .child(!dir)
            .expect("rotation requires a child opposite the rotation direction");
        let across = self.node(up).child(dir);

        if let Some(across) = across {
            self.node_mut(across).parent = Some(node);
        }
        self.node_mut(node).set_child(!dir, across);
        self.node_mut(up).set_child(dir, Some(node));

        let parent = self.node(node).parent;
        self.node_mut(up).parent = parent;
        self.node_mut(node).parent = Some(up);

        self.update(node);
        self.update(up);
        up
    }

    /// Repairs a height-2 imbalance on the `heavy` side of `node`.
    ///
    /// When the heavy child leans the other way a single rotation would not
    /// restore balance, so the heavy child is rotated first (the double
    /// rotation case).
    fn fix_heavy(&mut self, node: NodeId, heavy: Dir) -> NodeId {
        let child = self
            .node(node)
            .child(heavy)
            .expect("an imbalance implies a child on the heavy side");

        let outer = self.height_of(self.node(child).child(heavy));
        let inner = self.height_of(self.node(child).child(!heavy));
        if outer < inner {
            let child = self.rotate(child, heavy);
            self.node_mut(node).set_child(heavy, Some(child));
        }

        self.rotate(node, !heavy)
    }

    /// Walks from `start` to the root, refreshing augmentation and repairing
    /// imbalances along the way. Returns the root.
    ///
    /// `start`'s subtree must be internally consistent; its balance factor
    /// may be off by at most 2, the result of a single insertion or removal
    /// one level below.
    fn rebalance(&mut self, start: NodeId) -> NodeId {
        let mut node = start;

        loop {
            self.update(node);
            let l = self.height_of(self.node(node).left());
            let r = self.height_of(self.node(node).right());

            // The slot to reattach into, captured now: a rotation below
            // changes this node's parent link.
            let slot = self
                .node(node)
                .parent
                .map(|parent| (parent, self.which_child(parent, node)));

            if l == r + 2 {
                node = self.fix_heavy(node, Dir::Left);
            } else if r == l + 2 {
                node = self.fix_heavy(node, Dir::Right);
            }

            match slot {
                Some((parent, dir)) => {
                    self.node_mut(parent).set_child(dir, Some(node));
                    node = parent;
                }
                None => return node,
            }
        }
    }

    /// Unlinks `node` from the tree and returns the new root.
    ///
    /// The node's own links are left stale; the caller frees its slot
    /// immediately, which is what makes that safe.
    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let Some(right) = self.node(node).right() else {
            // No right subtree: the left subtree takes the node's place.
            let parent = self.node(node).parent;
            let left = self.node(node).left();

            if let Some(left) = left {
                self.node_mut(left).parent = parent;
            }

            return match parent {
                Some(parent) => {
                    let dir = self.which_child(parent, node);
                    self.node_mut(parent).set_child(dir, left);
                    Some(self.rebalance(parent))
                }
                None => left,
            };
        };

        // The in-order successor: the leftmost node of the right subtree.
        let succ = self.extremum(right, Dir::Left);

        // Splice the successor out of its slot. It has no left child, so its
        // right child (if any) is elevated. The rebalance runs with the
        // doomed node still in place; the successor takes over its position
        // and augmentation afterwards.
        let succ_parent = self.node(succ).parent.expect("successor has a parent");
        let succ_dir = self.which_child(succ_parent, succ);
        let succ_right = self.node(succ).right();

        if let Some(elevated) = succ_right {
            self.node_mut(elevated).parent = Some(succ_parent);
        }
        self.node_mut(succ_parent).set_child(succ_dir, succ_right);
        let root = self.rebalance(succ_parent);

        // Field copy plus index patch-up: the successor assumes the node's
        // links, height and count. The node's links are read only after the
        // rebalance, which may have rotated it.
        let (parent, children, height, count) = {
            let n = self.node(node);
            (n.parent, n.children, n.height, n.count)
        };

        let s = self.node_mut(succ);
        s.parent = parent;
        s.children = children;
        s.height = height;
        s.count = count;

        for child in children.into_iter().flatten() {
            self.node_mut(child).parent = Some(succ);
        }

        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, node);
                self.node_mut(parent).set_child(dir, Some(succ));
                Some(root)
            }
            None => Some(succ),
        }
    }
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        AvlTree::new()
    }
}
