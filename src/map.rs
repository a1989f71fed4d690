use core::borrow::Borrow;
use core::cmp::Ordering;
use core::mem;

use crate::{AvlTree, Dir, Iter, NodeId};

/// An ordered map based on an [`AvlTree`], with order-statistic lookups.
///
/// The map owns the comparator side of the contract: it walks the tree's
/// links by key comparison and hands structural decisions (linking,
/// rebalancing, deletion, rank navigation) to the tree. Besides the usual
/// ordered-map operations it answers positional queries in O(log n):
/// [`get_index`](RankMap::get_index) and
/// [`offset_from`](RankMap::offset_from).
pub struct RankMap<K: Ord, V> {
    tree: AvlTree<(K, V)>,
}

impl<K: Ord, V> RankMap<K, V> {
    /// Creates a new, empty `RankMap`.
    pub const fn new() -> Self {
        RankMap {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present, its value is replaced and the old
    /// value returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Some(root) = self.tree.root() else {
            self.tree.insert_root((key, value));
            return None;
        };

        // Descend by comparison until a slot for the key opens up.
        let mut cur = root;
        loop {
            let dir = match key.cmp(&self.tree.get(cur).0) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => {
                    return Some(mem::replace(&mut self.tree.get_mut(cur).1, value));
                }
            };

            match self.tree.child(cur, dir) {
                Some(child) => cur = child,
                None => {
                    self.tree.insert_under(cur, dir, (key, value));
                    return None;
                }
            }
        }
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node| &self.tree.get(node).1)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key)?;
        Some(&mut self.tree.get_mut(node).1)
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| self.entry_at(node))
    }

    /// Removes and returns the first key-value pair in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node = self.tree.first()?;
        Some(self.tree.remove(node))
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| self.entry_at(node))
    }

    /// Removes and returns the last key-value pair in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node = self.tree.last()?;
        Some(self.tree.remove(node))
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key)?;
        Some(self.tree.remove(node).1)
    }

    /// Returns the entry at position `index` in ascending key order, where
    /// the smallest key sits at index 0.
    ///
    /// This operation completes in _O(log(n))_ time regardless of `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        let first = self.tree.first()?;
        let offset = i64::try_from(index).ok()?;

        self.tree.offset(first, offset).map(|node| self.entry_at(node))
    }

    /// Returns the entry `offset` positions away from `key` in ascending key
    /// order. An offset of 0 returns `key`'s own entry; negative offsets
    /// move toward smaller keys.
    ///
    /// Returns `None` if `key` is not in the map or the offset runs past
    /// either end.
    pub fn offset_from<Q>(&self, key: &Q, offset: i64) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key)?;

        self.tree.offset(node, offset).map(|node| self.entry_at(node))
    }

    /// Returns a borrowed iterator over the map's entries in ascending key
    /// order.
    pub fn iter(&self) -> Entries<'_, K, V> {
        Entries {
            inner: self.tree.iter(),
        }
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();

        // The structural invariants say nothing about ordering; check that
        // here, where the comparator lives.
        let mut entries = self.iter();
        if let Some((mut prev, _)) = entries.next() {
            for (key, _) in entries {
                assert!(prev < key, "keys out of order");
                prev = key;
            }
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.tree.root();

        loop {
            let node = cur?;

            match key.cmp(self.tree.get(node).0.borrow()) {
                Ordering::Less => cur = self.tree.left(node),
                Ordering::Equal => return Some(node),
                Ordering::Greater => cur = self.tree.right(node),
            }
        }
    }

    fn entry_at(&self, node: NodeId) -> (&K, &V) {
        let (key, value) = self.tree.get(node);
        (key, value)
    }
}

impl<K: Ord, V> Default for RankMap<K, V> {
    fn default() -> Self {
        RankMap::new()
    }
}

/// A borrowed iterator over a [`RankMap`]'s entries in ascending key order.
pub struct Entries<'map, K, V> {
    inner: Iter<'map, (K, V)>,
}

impl<'map, K, V> Iterator for Entries<'map, K, V> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}
