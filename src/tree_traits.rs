//! Text rendering of the roster index for `muster tree`.
use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::Roster;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

// Shape of the AVL index: each node shows its name and cached height,
// missing children of an inner node are drawn as "·" so left/right stay visible.
impl TreeNodeConvert for Roster {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn label(roster: &Roster, idx: Index) -> String {
            roster
                .node(idx)
                .map(|n| format!("{} (h={})", n.unit().name(), n.height()))
                .unwrap_or_default()
        }

        fn build_tree(roster: &Roster, idx: Index, parent_tree: &mut Tree<String>) {
            let Some(node) = roster.node(idx) else {
                return;
            };
            if node.left().is_none() && node.right().is_none() {
                return;
            }
            for child in [node.left(), node.right()] {
                match child {
                    Some(child_idx) => {
                        let mut child_tree = Tree::new(label(roster, child_idx));
                        build_tree(roster, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                    None => {
                        parent_tree.push(Tree::new("·".to_string()));
                    }
                }
            }
        }

        match self.root() {
            Some(root_idx) => {
                let mut tree = Tree::new(label(self, root_idx));
                build_tree(self, root_idx, &mut tree);
                tree
            }
            None => Tree::new("Empty roster".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UnitBuilder;

    #[test]
    fn test_render_shape() {
        let mut roster = Roster::new();
        for name in ["B", "A", "C", "D"] {
            roster
                .insert(UnitBuilder::new(name, "1 1 1 1 1 1 1 1 1 1").unwrap().build())
                .unwrap();
        }

        let rendered = roster.to_tree_string().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "B (h=3)");
        assert!(lines[1].ends_with("A (h=1)"));
        assert!(lines[2].ends_with("C (h=2)"));
        assert!(lines[3].ends_with("·"));
        assert!(lines[4].ends_with("D (h=1)"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(Roster::new().to_tree_string().to_string().trim(), "Empty roster");
    }
}
