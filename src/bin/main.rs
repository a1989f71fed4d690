use std::cmp::Ordering;

use arena_avl::{AvlTree, Dir, RankMap};

/// Walks the links by comparison and hands the chosen slot to the tree, the
/// way an embedding collection drives insertion.
fn insert(tree: &mut AvlTree<u32>, value: u32) {
    let Some(root) = tree.root() else {
        tree.insert_root(value);
        return;
    };

    let mut cur = root;
    loop {
        let dir = match value.cmp(tree.get(cur)) {
            Ordering::Less => Dir::Left,
            Ordering::Greater => Dir::Right,
            Ordering::Equal => return,
        };

        match tree.child(cur, dir) {
            Some(child) => cur = child,
            None => {
                tree.insert_under(cur, dir, value);
                return;
            }
        }
    }
}

fn main() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for value in [2, 0, 3, 4, 5, 1, 6] {
        insert(&mut tree, value);
        tree.assert_invariants();
        println!("{:?}", tree.iter().collect::<Vec<_>>());
    }

    // Jump around the sorted order by rank offset.
    let min = tree.first().unwrap();
    let four = tree.offset(min, 4).unwrap();
    println!("4 places after the minimum: {}", tree.get(four));
    let back = tree.offset(four, -3).unwrap();
    println!("3 places back from there: {}", tree.get(back));

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot).unwrap();
    println!("{dot}");

    let mut map: RankMap<u32, &str> = RankMap::new();
    map.insert(3, "three");
    map.insert(1, "one");
    map.insert(2, "two");

    for (key, value) in map.iter() {
        println!("{key} => {value}");
    }
    println!("median entry: {:?}", map.get_index(map.len() / 2));

    let removed = map.remove(&2);
    println!("removed {removed:?}, median now {:?}", map.get_index(map.len() / 2));
}
