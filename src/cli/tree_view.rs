//! termtree rendering of the discipline hierarchy.

use generational_arena::Index;
use termtree::Tree;

use crate::domain::{DisciplineNode, DisciplineTree};

pub trait TreeNodeConvert {
    /// One rendered tree per top-level discipline.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;
}

impl TreeNodeConvert for DisciplineTree {
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        fn build(tree: &DisciplineTree, idx: Index) -> Option<Tree<String>> {
            let node = tree.get_node(idx)?;
            let leaves: Vec<_> = node
                .children()
                .iter()
                .filter_map(|&child| build(tree, child))
                .collect();
            Some(Tree::new(label(node)).with_leaves(leaves))
        }

        self.roots()
            .iter()
            .filter_map(|&root| build(self, root))
            .collect()
    }
}

/// `哲学 (incomplete) [leaf]`
pub fn label(node: &DisciplineNode) -> String {
    let status = if node.is_completed {
        "complete"
    } else {
        "incomplete"
    };
    if node.is_leaf {
        format!("{} ({}) [leaf]", node.name, status)
    } else {
        format!("{} ({})", node.name, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScanRecord, TreeBuilder};
    use std::path::{Path, PathBuf};

    #[test]
    fn given_tree_when_rendering_then_shows_status_and_leaf_tags() {
        let records = ["C", "C/D (未完成)", "C/E"].iter().map(|r| ScanRecord {
            relative: PathBuf::from(r),
            files: vec![],
        });
        let tree = TreeBuilder::default()
            .build(Path::new("/base"), records)
            .unwrap();

        let rendered: Vec<String> = tree.to_tree_strings().iter().map(|t| t.to_string()).collect();

        assert_eq!(rendered.len(), 1);
        let text = &rendered[0];
        assert!(text.starts_with("C (complete)\n"));
        assert!(text.contains("D (incomplete) [leaf]"));
        assert!(text.contains("E (complete) [leaf]"));
    }
}
