//! Differential-testing support shared by the proptest suite and the fuzz
//! targets.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::arbitrary::any;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, Dir, NodeId, RankMap};

/// Inserts `value` into a payload-only tree the way an embedding collection
/// would: the caller walks the links by comparison, then hands the chosen
/// slot to the tree. Returns `false` (and inserts nothing) if the value is
/// already present.
pub fn insert_value(tree: &mut AvlTree<u32>, value: u32) -> bool {
    let Some(root) = tree.root() else {
        tree.insert_root(value);
        return true;
    };

    let mut cur = root;
    loop {
        let dir = match value.cmp(tree.get(cur)) {
            Ordering::Less => Dir::Left,
            Ordering::Greater => Dir::Right,
            Ordering::Equal => return false,
        };

        match tree.child(cur, dir) {
            Some(child) => cur = child,
            None => {
                tree.insert_under(cur, dir, value);
                return true;
            }
        }
    }
}

/// Finds the node holding `value` in a payload-only tree.
pub fn find_value(tree: &AvlTree<u32>, value: u32) -> Option<NodeId> {
    let mut cur = tree.root();

    loop {
        let node = cur?;

        match value.cmp(tree.get(node)) {
            Ordering::Less => cur = tree.left(node),
            Ordering::Equal => return Some(node),
            Ordering::Greater => cur = tree.right(node),
        }
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

fn offset_strategy() -> impl Strategy<Value = i64> {
    proptest::prop_oneof![
        4 => -8_i64..=8,
        1 => any::<i64>(),
    ]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
    GetIndex(usize),
    OffsetFrom(ItemValue, i64),
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
            // Mostly in range, occasionally one or two past the end.
            Op::GetIndex(raw) => FinalOp::GetIndex(raw % (sorted.len() + 2)),
            Op::OffsetFrom(item, delta) => FinalOp::OffsetFrom(get_value(sorted, item), delta),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    First,
    PopFirst,
    Last,
    PopLast,
    GetIndex(usize),
    OffsetFrom(u32, i64),
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
        any::<usize>().prop_map(Op::GetIndex),
        (value_strategy(), offset_strategy()).prop_map(|(item, delta)| Op::OffsetFrom(item, delta)),
    ]
}

/// Replays `ops` against a [`RankMap`] and a [`BTreeMap`] side by side,
/// checking that every observable result agrees and that the tree invariants
/// hold after every step.
///
/// The key-sorted mirror vec doubles as the oracle for the positional
/// operations, which a `BTreeMap` cannot answer directly.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut map: RankMap<u32, u32> = RankMap::new();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    // Values are derived from keys so that replacement is observable.
    fn value_for(key: u32) -> u32 {
        !key
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(key) => {
                insert_sorted(&mut sorted_values, key);

                let from_btree = btree.insert(key, value_for(key));
                let from_map = map.insert(key, value_for(key));

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key);
                let from_map = map.get(&key);

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_values, key);

                let from_btree = btree.remove(&key);
                let from_map = map.remove(&key);

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_map = map.first_key_value();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_map = map.pop_first();

                if let Some((key, _)) = from_map {
                    remove_sorted(&mut sorted_values, key);
                }

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_map = map.last_key_value();

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_map = map.pop_last();

                if let Some((key, _)) = from_map {
                    remove_sorted(&mut sorted_values, key);
                }

                assert_eq!(from_btree, from_map, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::GetIndex(index) => {
                let expected = sorted_values.get(index).map(|&key| (key, value_for(key)));
                let actual = map.get_index(index).map(|(&key, &value)| (key, value));

                assert_eq!(expected, actual, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::OffsetFrom(key, delta) => {
                let expected = sorted_values.binary_search(&key).ok().and_then(|pos| {
                    let target = pos as i128 + i128::from(delta);
                    usize::try_from(target).ok().and_then(|t| sorted_values.get(t))
                });
                let expected = expected.map(|&key| (key, value_for(key)));
                let actual = map.offset_from(&key, delta).map(|(&key, &value)| (key, value));

                assert_eq!(expected, actual, "FinalOp #{op_id}: {op:?}");
            }
        }

        map.assert_invariants();
        assert_eq!(btree.len(), map.len());
        assert!(btree.iter().zip(map.iter()).all(|(a, b)| a == b));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to
    // check equivalence.
    MovePrev,
    MoveNext,
    MoveBy(i64),
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        offset_strategy().prop_map(CursorOp::MoveBy),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

/// Replays cursor operations against a plain index cursor over a sorted vec.
///
/// `MoveBy` doubles as the oracle for the offset walk: on the vec side it is
/// nothing but index arithmetic.
pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    let mut vec = Vec::new();
    let mut tree: AvlTree<u32> = AvlTree::new();

    for val in values {
        vec.push(val);
        insert_value(&mut tree, val);
    }

    fn vec_curs_prev(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    fn vec_curs_by(v: &[u32], curs: Option<usize>, offset: i64) -> Option<usize> {
        let len = v.len() as i128;
        let target = match curs {
            Some(i) => i as i128 + i128::from(offset),
            None if offset > 0 => i128::from(offset) - 1,
            None if offset < 0 => len + i128::from(offset),
            None => return None,
        };

        (0..len).contains(&target).then(|| target as usize)
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut tree_curs = tree.cursor_first_mut();

    // Check that the initial states are equivalent.
    {
        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get();

        assert_eq!(v, t);
    }

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                tree_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                tree_curs.move_prev();
            }

            CursorOp::MoveBy(offset) => {
                vec_curs = vec_curs_by(&vec, vec_curs, offset);
                tree_curs.move_by(offset);
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_next();

                assert_eq!(v, t);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| &vec[i]);
                let t = tree_curs.peek_prev();

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let t = tree_curs.remove_current();

                assert_eq!(v, t);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_v_curs = vec_curs.is_some().then(|| vec_curs_prev(&vec, vec_curs));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_v_curs {
                    vec_curs = vc;
                }

                let t = tree_curs.remove_current_and_move_prev();

                assert_eq!(v, t);
            }
        }

        let v = vec_curs.map(|i| &vec[i]);
        let t = tree_curs.get();

        assert_eq!(v, t);
    }
}
