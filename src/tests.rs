use std::ops::Range;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::model::{self, find_value, insert_value};

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for &key in keys {
        map.insert(key, !key);
        map.assert_invariants();
    }

    for &key in keys {
        assert_eq!(map.get(&key), Some(&!key), "key {key} not found");
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for &key in keys {
        map.insert(key, !key);
        map.assert_invariants();
    }

    for &key in keys {
        assert_eq!(map.remove(&key), Some(!key));
        map.assert_invariants();
    }

    assert!(map.is_empty());

    for &key in keys {
        map.insert(key, !key);
        map.assert_invariants();
    }

    for &key in keys.iter().rev() {
        assert_eq!(map.remove(&key), Some(!key));
        map.assert_invariants();
    }

    assert!(map.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

#[test]
fn iteration_is_sorted() {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for key in [5, 3, 8, 1, 4, 7, 9] {
        map.insert(key, !key);
        map.assert_invariants();
    }

    let keys: Vec<u32> = map.iter().map(|(&key, _)| key).collect();
    assert_eq!(keys, vec![1, 3, 4, 5, 7, 8, 9]);
}

#[test]
fn removing_sole_node_empties_tree() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    let node = tree.insert_root(7);
    tree.assert_invariants();

    assert_eq!(tree.remove(node), 7);
    tree.assert_invariants();
    assert!(tree.is_empty());
    assert_eq!(tree.first(), None);
}

#[test]
fn offsets_from_a_mid_key() {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for key in 1..=10 {
        map.insert(key, !key);
    }
    map.assert_invariants();

    let key_at = |key: u32, delta: i64| map.offset_from(&key, delta).map(|(&k, _)| k);

    assert_eq!(key_at(5, 0), Some(5));
    assert_eq!(key_at(5, 2), Some(7));
    assert_eq!(key_at(5, -2), Some(3));
    assert_eq!(key_at(5, 5), Some(10));
    assert_eq!(key_at(5, -4), Some(1));
    assert_eq!(key_at(5, 6), None);
    assert_eq!(key_at(5, -5), None);
    assert_eq!(key_at(5, i64::MAX), None);
    assert_eq!(key_at(5, i64::MIN), None);
    assert_eq!(key_at(11, 0), None);
}

#[test]
fn offset_from_minimum_reaches_every_rank() {
    for size in 1..200u32 {
        let mut tree: AvlTree<u32> = AvlTree::new();

        for value in 0..size {
            insert_value(&mut tree, value);
        }
        tree.assert_invariants();

        let min = tree.first().expect("tree is non-empty");
        for rank in 0..size {
            let node = tree
                .offset(min, i64::from(rank))
                .expect("rank is within the tree");
            assert_eq!(*tree.get(node), rank);
        }

        assert_eq!(tree.offset(min, i64::from(size)), None);
        assert_eq!(tree.offset(min, -1), None);
    }
}

#[test]
fn offset_connects_all_pairs() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    // Insertion order shouldn't matter; scramble it.
    let mut state = 0x9e3779b97f4a7c15u64;
    let mut values: Vec<u32> = (0..33).collect();
    shuffle(&mut values, &mut state);

    for &value in &values {
        insert_value(&mut tree, value);
    }
    tree.assert_invariants();

    let nodes: Vec<NodeId> = (0..33)
        .map(|value| find_value(&tree, value).expect("value was inserted"))
        .collect();

    for (i, &from) in nodes.iter().enumerate() {
        // An offset of zero is the node itself.
        assert_eq!(tree.offset(from, 0), Some(from));

        for (j, &to) in nodes.iter().enumerate() {
            let delta = j as i64 - i as i64;
            assert_eq!(tree.offset(from, delta), Some(to), "from {i} by {delta}");
        }
    }
}

#[test]
fn get_index_selects_by_rank() {
    let mut map: RankMap<u32, &str> = RankMap::new();

    for key in (10..20).rev() {
        map.insert(key, "x");
    }

    for index in 0..10 {
        let (&key, _) = map.get_index(index).expect("index is within the map");
        assert_eq!(key, 10 + index as u32);
    }

    assert_eq!(map.get_index(10), None);
    assert_eq!(map.get_index(usize::MAX), None);
}

#[test]
fn pop_drains_in_order() {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for key in [6, 1, 9, 4, 0, 7, 3, 8, 2, 5] {
        map.insert(key, !key);
    }

    for expected in 0..10 {
        assert_eq!(map.pop_first(), Some((expected, !expected)));
        map.assert_invariants();
    }
    assert!(map.is_empty());

    for key in [6, 1, 9, 4, 0, 7, 3, 8, 2, 5] {
        map.insert(key, !key);
    }

    for expected in (0..10).rev() {
        assert_eq!(map.pop_last(), Some((expected, !expected)));
        map.assert_invariants();
    }
    assert!(map.is_empty());
}

#[test]
fn clear_resets_the_tree() {
    let mut map: RankMap<u32, u32> = RankMap::new();

    for key in 0..100 {
        map.insert(key, !key);
    }

    map.clear();
    map.assert_invariants();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);

    map.insert(1, !1);
    map.assert_invariants();
    assert_eq!(map.len(), 1);
}

fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

fn shuffle<T>(values: &mut [T], state: &mut u64) {
    for i in (1..values.len()).rev() {
        let j = (xorshift(state) % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn randomized_height_stays_within_avl_bound() {
    const N: usize = 100_000;

    let mut tree: AvlTree<u32> = AvlTree::with_capacity(N);
    let mut inserted = Vec::with_capacity(N);
    let mut state = 0x243f6a8885a308d3u64;

    while inserted.len() < N {
        let value = (xorshift(&mut state) % 1_000_000) as u32;
        if insert_value(&mut tree, value) {
            inserted.push(value);
        }
    }

    tree.assert_invariants();

    // A tree obeying the balance rule has height at most
    // 1.4405 * log2(n + 2).
    let height = tree.height(tree.root().expect("tree is non-empty"));
    let bound = (1.4405 * ((N + 2) as f64).log2()).floor() as u32;
    assert!(
        height <= bound,
        "height {height} exceeds the balance bound {bound}",
    );

    // Drain in an unrelated order; the tree must stay consistent throughout
    // and end up empty.
    shuffle(&mut inserted, &mut state);

    for (i, value) in inserted.into_iter().enumerate() {
        let node = find_value(&tree, value).expect("value was inserted");
        assert_eq!(tree.remove(node), value);

        if i % 4096 == 0 {
            tree.assert_invariants();
        }
    }

    tree.assert_invariants();
    assert!(tree.is_empty());
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(any::<u32>(), 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }
}
