use crate::{AvlTree, NodeId};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to a node of the tree or to a "ghost" non-element
/// that connects the last node to the first.
pub struct Cursor<'tree, T> {
    tree: &'tree AvlTree<T>,
    at: Option<NodeId>,
}

impl<'tree, T> Cursor<'tree, T> {
    pub(crate) fn first(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor { tree, at: tree.first() }
    }

    pub(crate) fn last(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor { tree, at: tree.last() }
    }

    /// Returns the node the cursor points to, or `None` for the "ghost"
    /// non-element.
    pub fn node(&self) -> Option<NodeId> {
        self.at
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the
    /// "ghost" non-element.
    pub fn get(&self) -> Option<&'tree T> {
        self.at.map(|id| self.tree.get(id))
    }

    /// Moves the cursor to the next node of the tree.
    ///
    /// Moving past the last node lands on the "ghost" non-element; moving
    /// off the ghost lands on the first node.
    pub fn move_next(&mut self) {
        self.at = match self.at {
            Some(id) => self.tree.next(id),
            None => self.tree.first(),
        };
    }

    /// Moves the cursor to the previous node of the tree.
    ///
    /// Moving past the first node lands on the "ghost" non-element; moving
    /// off the ghost lands on the last node.
    pub fn move_prev(&mut self) {
        self.at = match self.at {
            Some(id) => self.tree.prev(id),
            None => self.tree.last(),
        };
    }

    /// Moves the cursor `offset` places through the in-order sequence using
    /// the subtree counts, in O(log n) regardless of the distance.
    ///
    /// A move past either end lands on the "ghost" non-element. From the
    /// ghost, a positive offset re-enters at the first node and a negative
    /// one at the last, so `move_by(1)` and `move_by(-1)` agree with
    /// [`move_next`](Cursor::move_next) and [`move_prev`](Cursor::move_prev)
    /// everywhere.
    pub fn move_by(&mut self, offset: i64) {
        self.at = jump(self.tree, self.at, offset);
    }

    /// Returns a reference to the next item without moving the cursor.
    pub fn peek_next(&self) -> Option<&'tree T> {
        let next = match self.at {
            Some(id) => self.tree.next(id),
            None => self.tree.first(),
        };

        next.map(|id| self.tree.get(id))
    }

    /// Returns a reference to the previous item without moving the cursor.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        let prev = match self.at {
            Some(id) => self.tree.prev(id),
            None => self.tree.last(),
        };

        prev.map(|id| self.tree.get(id))
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to a node of the tree or to a "ghost" non-element
/// that connects the last node to the first.
pub struct CursorMut<'tree, T> {
    tree: &'tree mut AvlTree<T>,
    at: Option<NodeId>,
}

impl<'tree, T> CursorMut<'tree, T> {
    pub(crate) fn first(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let at = tree.first();
        CursorMut { tree, at }
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let at = tree.last();
        CursorMut { tree, at }
    }

    /// Returns a read-only cursor pointing to the current node.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the
    /// returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            tree: &*self.tree,
            at: self.at,
        }
    }

    /// Returns the node the cursor points to, or `None` for the "ghost"
    /// non-element.
    pub fn node(&self) -> Option<NodeId> {
        self.at
    }

    /// Returns a reference to the item pointed to by the cursor.
    pub fn get(&self) -> Option<&T> {
        self.at.map(|id| self.tree.get(id))
    }

    /// Returns a mutable reference to the item pointed to by the cursor.
    ///
    /// Mutation must not change the node's position in whatever order the
    /// embedding collection maintains.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let id = self.at?;
        Some(self.tree.get_mut(id))
    }

    /// Moves the cursor to the next node of the tree.
    pub fn move_next(&mut self) {
        self.at = match self.at {
            Some(id) => self.tree.next(id),
            None => self.tree.first(),
        };
    }

    /// Moves the cursor to the previous node of the tree.
    pub fn move_prev(&mut self) {
        self.at = match self.at {
            Some(id) => self.tree.prev(id),
            None => self.tree.last(),
        };
    }

    /// Moves the cursor `offset` places through the in-order sequence; see
    /// [`Cursor::move_by`].
    pub fn move_by(&mut self, offset: i64) {
        self.at = jump(self.tree, self.at, offset);
    }

    /// Returns a reference to the next item without moving the cursor.
    pub fn peek_next(&self) -> Option<&T> {
        self.as_cursor().peek_next()
    }

    /// Returns a reference to the previous item without moving the cursor.
    pub fn peek_prev(&self) -> Option<&T> {
        self.as_cursor().peek_prev()
    }

    /// Removes the current node from the tree.
    ///
    /// This returns the removed item and moves the cursor to the next node.
    /// If the cursor is pointing to the "ghost" non-element, this method
    /// returns `None`, and neither the tree nor the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T> {
        let remove = self.at?;

        self.at = self.tree.next(remove);
        Some(self.tree.remove(remove))
    }

    /// Removes the current node from the tree.
    ///
    /// This returns the removed item and moves the cursor to the previous
    /// node. If the cursor is pointing to the "ghost" non-element, this
    /// method returns `None`, and neither the tree nor the cursor is
    /// modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T> {
        let remove = self.at?;

        self.at = self.tree.prev(remove);
        Some(self.tree.remove(remove))
    }
}

/// Shared `move_by` logic: from the ghost, a move re-enters the sequence at
/// the end matching its sign.
fn jump<T>(tree: &AvlTree<T>, at: Option<NodeId>, offset: i64) -> Option<NodeId> {
    match at {
        Some(id) => tree.offset(id, offset),
        None if offset > 0 => tree.first().and_then(|first| tree.offset(first, offset - 1)),
        None if offset < 0 => tree.last().and_then(|last| tree.offset(last, offset + 1)),
        None => None,
    }
}
