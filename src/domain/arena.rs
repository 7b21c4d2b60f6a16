use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{DisciplinePath, LeafSummary};
use crate::domain::error::DomainError;

/// One directory level of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisciplineNode {
    /// Cleaned display name (marker removed)
    pub name: String,
    /// Literal on-disk directory name, possibly carrying the marker
    pub original_name: String,
    /// Directory currently backing this node
    pub path: PathBuf,
    pub is_completed: bool,
    /// Set by [`DisciplineTree::classify_leaves`]
    pub is_leaf: bool,
    /// Plain filenames directly inside the directory
    pub files: BTreeSet<String>,
    parent: Option<Index>,
    children: Vec<Index>,
}

impl DisciplineNode {
    pub fn new(name: String, original_name: String, path: PathBuf, is_completed: bool) -> Self {
        Self {
            name,
            original_name,
            path,
            is_completed,
            is_leaf: true,
            files: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    /// Child indices, ordered by cleaned name.
    pub fn children(&self) -> &[Index] {
        &self.children
    }
}

/// Arena-based forest of disciplines rooted at one base directory.
///
/// The tree is a cache of the directory layout: it can go stale when the
/// filesystem changes underneath it, and a fresh scan is the way to refresh it.
/// Siblings are kept sorted by cleaned name so iteration order does not depend
/// on how the tree was produced.
#[derive(Debug)]
pub struct DisciplineTree {
    arena: Arena<DisciplineNode>,
    roots: Vec<Index>,
    base_dir: PathBuf,
}

impl DisciplineTree {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[instrument(level = "trace", skip(self, node), fields(name = %node.name))]
    pub fn insert_node(&mut self, mut node: DisciplineNode, parent: Option<Index>) -> Index {
        node.parent = parent;
        let name = node.name.clone();
        let node_idx = self.arena.insert(node);

        let pos = {
            let siblings = match parent {
                Some(p) => self.arena.get(p).map(|n| n.children.as_slice()).unwrap_or(&[]),
                None => self.roots.as_slice(),
            };
            siblings
                .binary_search_by(|&idx| self.arena[idx].name.as_str().cmp(name.as_str()))
                .unwrap_or_else(|p| p)
        };
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.arena.get_mut(p) {
                    parent_node.children.insert(pos, node_idx);
                }
            }
            None => self.roots.insert(pos, node_idx),
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&DisciplineNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut DisciplineNode> {
        self.arena.get_mut(idx)
    }

    /// Child of `parent` (or top-level node when `None`) with the given cleaned name.
    pub fn find_child(&self, parent: Option<Index>, name: &str) -> Option<Index> {
        let siblings = match parent {
            Some(p) => self.arena.get(p).map(|n| n.children.as_slice())?,
            None => self.roots.as_slice(),
        };
        siblings
            .binary_search_by(|&idx| self.arena[idx].name.as_str().cmp(name))
            .ok()
            .map(|pos| siblings[pos])
    }

    /// Descend the tree by cleaned names.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<Index, DomainError> {
        let not_found = || {
            DomainError::PathNotFound(
                path.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join("/"),
            )
        };
        let mut current = None;
        for segment in path {
            current = Some(
                self.find_child(current, segment.as_ref())
                    .ok_or_else(not_found)?,
            );
        }
        current.ok_or_else(not_found)
    }

    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<&DisciplineNode, DomainError> {
        let idx = self.resolve(path)?;
        self.get_node(idx)
            .ok_or_else(|| DomainError::Internal(format!("dangling index {:?}", idx)))
    }

    /// Cleaned-name path from the top level down to `idx`.
    pub fn name_path(&self, idx: Index) -> DisciplinePath {
        let mut segments = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            match self.arena.get(i) {
                Some(node) => {
                    segments.push(node.name.clone());
                    current = node.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        DisciplinePath::new(segments)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Tag every node as leaf or internal.
    ///
    /// Must run once the tree is complete; calling it again is harmless.
    #[instrument(level = "debug", skip(self))]
    pub fn classify_leaves(&mut self) {
        let order: Vec<(Index, bool)> = self
            .iter_postorder()
            .map(|(idx, node)| (idx, node.children.is_empty()))
            .collect();
        for (idx, is_leaf) in order {
            if let Some(node) = self.arena.get_mut(idx) {
                node.is_leaf = is_leaf;
            }
        }
    }

    /// Every leaf with its name path, depth-first in sibling order.
    pub fn leaves(&self) -> LeafIterator<'_> {
        LeafIterator::new(self)
    }

    /// `(path, is_completed)` for every leaf.
    pub fn all_leaves(&self) -> impl Iterator<Item = (DisciplinePath, bool)> + '_ {
        self.leaves().map(|(path, node)| (path, node.is_completed))
    }

    /// Paths of leaves still carrying the marker; the first one is "next".
    pub fn incomplete_leaves(&self) -> impl Iterator<Item = DisciplinePath> + '_ {
        self.leaves()
            .filter(|(_, node)| !node.is_completed)
            .map(|(path, _)| path)
    }

    pub fn summary(&self) -> LeafSummary {
        self.leaves().fold(LeafSummary::default(), |mut acc, (_, node)| {
            acc.total += 1;
            if node.is_completed {
                acc.completed += 1;
            } else {
                acc.incomplete += 1;
            }
            acc
        })
    }

    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Record a completed rename of the directory behind `idx`.
    ///
    /// Updates name, path and completion together, then rewrites the cached
    /// path of every descendant to hang off the new directory.
    #[instrument(level = "debug", skip(self))]
    pub fn apply_rename(
        &mut self,
        idx: Index,
        original_name: String,
        path: PathBuf,
        is_completed: bool,
    ) -> Result<(), DomainError> {
        let node = self
            .arena
            .get_mut(idx)
            .ok_or_else(|| DomainError::Internal(format!("dangling index {:?}", idx)))?;
        node.original_name = original_name;
        node.path = path;
        node.is_completed = is_completed;

        let mut queue: VecDeque<Index> = VecDeque::from([idx]);
        while let Some(current) = queue.pop_front() {
            let (parent_path, children) = match self.arena.get(current) {
                Some(n) => (n.path.clone(), n.children.clone()),
                None => continue,
            };
            for child in children {
                if let Some(c) = self.arena.get_mut(child) {
                    c.path = parent_path.join(&c.original_name);
                    queue.push_back(child);
                }
            }
        }
        Ok(())
    }
}

/// Pre-order traversal over all nodes.
pub struct TreeIterator<'a> {
    tree: &'a DisciplineTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a DisciplineTree) -> Self {
        let stack = tree.roots.iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a DisciplineNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a DisciplineTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a DisciplineTree) -> Self {
        let stack = tree.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a DisciplineNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

/// Lazy pre-order walk yielding leaves together with their name path.
pub struct LeafIterator<'a> {
    tree: &'a DisciplineTree,
    stack: Vec<(Index, usize)>,
    path: Vec<String>,
}

impl<'a> LeafIterator<'a> {
    fn new(tree: &'a DisciplineTree) -> Self {
        let stack = tree.roots.iter().rev().map(|&r| (r, 0)).collect();
        Self {
            tree,
            stack,
            path: Vec::new(),
        }
    }
}

impl<'a> Iterator for LeafIterator<'a> {
    type Item = (DisciplinePath, &'a DisciplineNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth)) = self.stack.pop() {
            let Some(node) = self.tree.get_node(current_idx) else {
                continue;
            };
            self.path.truncate(depth);
            self.path.push(node.name.clone());
            if node.is_leaf {
                return Some((DisciplinePath::new(self.path.clone()), node));
            }
            for &child in node.children.iter().rev() {
                self.stack.push((child, depth + 1));
            }
        }
        None
    }
}
