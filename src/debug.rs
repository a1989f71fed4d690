use core::fmt::{self, Write as _};
use std::collections::VecDeque;

use crate::{AvlTree, Dir, NodeId};

impl<T: fmt::Display> AvlTree<T> {
    /// Writes the tree's shape to `w` in Graphviz dot format, one `rank=same`
    /// row per level, each node labeled with its payload, height and count.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root() {
            Some(root) => root,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        loop {
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let node = match queue.pop_front().unwrap() {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let index = node.to_index();
                let item = self.get(node);
                let height = self.height(node);
                let count = self.count(node);
                write!(
                    w,
                    "\"graph{name}-n{index}\" [label=\"{item}:{height}/{count}\"]; "
                )?;

                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = self.child(node, dir) {
                        let child_index = child.to_index();

                        queue.push_back(Item::Node(child));
                        writeln!(
                            links,
                            "\"graph{name}-n{index}\" -> \"graph{name}-n{child_index}\";"
                        )?;
                    } else {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            links,
                            "\"graph{name}-n{index}\" -> \"graph{name}-missing{missing}\";"
                        )?;
                        missing += 1;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
