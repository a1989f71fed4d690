use crate::{AvlTree, Dir, NodeId};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// A borrowed in-order iterator over an [`AvlTree`].
pub struct Iter<'tree, T> {
    tree: &'tree AvlTree<T>,

    cur: Option<NodeId>,
    from: CameFrom,

    len: usize,
}

impl<'tree, T> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree AvlTree<T>) -> Self {
        Iter {
            tree,

            cur: tree.root(),
            from: CameFrom::Parent,
            len: tree.len(),
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let mut cur = self.cur?;

        loop {
            match self.from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    while let Some(left) = self.tree.left(cur) {
                        cur = left;
                    }

                    // Once the minimum is found, its (empty) left subtree has
                    // been exhausted.
                    self.from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up
                    // next. Save off the iterator state and return it.
                    self.cur = Some(cur);
                    self.from = CameFrom::Here;
                    self.len -= 1;

                    return Some(self.tree.get(cur));
                }

                CameFrom::Here => {
                    // The current node was just yielded.
                    if let Some(right) = self.tree.right(cur) {
                        // If the right subtree is not empty, go there.
                        self.from = CameFrom::Parent;

                        cur = right;
                    } else if let Some(parent) = self.tree.parent(cur) {
                        // Otherwise, ascend one level.
                        self.from = match self.tree.which_child(parent, cur) {
                            Dir::Left => CameFrom::LeftChild,
                            Dir::Right => CameFrom::RightChild,
                        };

                        cur = parent;
                    } else {
                        // A lone root with nothing after it; the length guard
                        // has already returned.
                        unreachable!()
                    }
                }

                CameFrom::RightChild => {
                    // The subtree below is exhausted. Ascend until arriving
                    // from a left child; that parent is the successor. The
                    // length guard rules out running off the root.
                    while let Some(parent) = self.tree.parent(cur) {
                        let from = self.tree.which_child(parent, cur);
                        cur = parent;

                        if from == Dir::Left {
                            break;
                        }
                    }

                    self.from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
