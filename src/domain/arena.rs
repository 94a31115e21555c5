use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::loader::{LoaderKey, LoaderRef};

/// Tree node representing one loader identity.
#[derive(Debug)]
pub struct TreeNode {
    name: String,
    /// Snapshot of the loader's packages, replaced wholesale on every visit
    packages: Vec<String>,
    /// Execution unit label, written once at creation
    label: Option<String>,
    /// Index of parent node in the arena, None for the sentinel root
    parent: Option<Index>,
    children: HashMap<LoaderKey, Index>,
    /// Keeps the identity key valid; None for the sentinel root
    loader: Option<LoaderRef>,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    /// Child indices in the map's native (unordered) iteration order.
    pub fn children(&self) -> impl Iterator<Item = Index> + '_ {
        self.children.values().copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn loader(&self) -> Option<&LoaderRef> {
        self.loader.as_ref()
    }

    pub fn key(&self) -> Option<LoaderKey> {
        self.loader.as_ref().map(LoaderKey::of)
    }
}

/// Arena-backed loader tree rooted at a sentinel node.
///
/// Children are keyed by loader identity, so two loaders sharing a display
/// name are still distinct nodes.
#[derive(Debug)]
pub struct LoaderTree {
    arena: Arena<TreeNode>,
    root: Index,
}

impl LoaderTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            name: root_name.into(),
            packages: Vec::new(),
            label: None,
            parent: None,
            children: HashMap::new(),
            loader: None,
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Looks up the child of `parent` for `loader` without creating it.
    pub fn child_for(&self, parent: Index, loader: &LoaderRef) -> Option<Index> {
        self.arena
            .get(parent)
            .and_then(|node| node.children.get(&LoaderKey::of(loader)).copied())
    }

    /// Returns the child of `parent` for `loader`, creating it if absent.
    ///
    /// `label` is only applied to a node created by this call. The boolean is
    /// true when the node was created.
    #[instrument(level = "trace", skip(self, loader))]
    pub fn resolve_child(
        &mut self,
        parent: Index,
        loader: &LoaderRef,
        label: Option<&str>,
    ) -> (Index, bool) {
        if let Some(existing) = self.child_for(parent, loader) {
            return (existing, false);
        }

        let node_idx = self.arena.insert(TreeNode {
            name: loader.name(),
            packages: Vec::new(),
            label: label.map(str::to_string),
            parent: Some(parent),
            children: HashMap::new(),
            loader: Some(loader.clone()),
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.insert(LoaderKey::of(loader), node_idx);
        }
        (node_idx, true)
    }

    /// Replaces the node's package list. Nothing of the previous list is kept.
    pub fn replace_packages(&mut self, idx: Index, packages: Vec<String>) {
        if let Some(node) = self.arena.get_mut(idx) {
            node.packages = packages;
        }
    }

    /// Number of nodes, sentinel root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when only the sentinel root exists.
    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    /// Loader identities present anywhere in the tree.
    pub fn keys(&self) -> HashSet<LoaderKey> {
        self.arena.iter().filter_map(|(_, node)| node.key()).collect()
    }

    /// Names from the root down to `idx`, sentinel included.
    pub fn path_names(&self, idx: Index) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current.and_then(|i| self.arena.get(i)) {
            names.push(node.name.clone());
            current = node.parent;
        }
        names.reverse();
        names
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get(node_idx) {
            1 + node
                .children()
                .map(|child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Pre-order traversal yielding `(depth, index, node)`; the root has depth 0.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a LoaderTree,
    stack: Vec<(usize, Index)>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a LoaderTree) -> Self {
        Self {
            tree,
            stack: vec![(0, tree.root)],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (usize, Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, current_idx)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current_idx) {
                // Reverse so the first child in map order is visited first
                let children: Vec<Index> = node.children().collect();
                for &child in children.iter().rev() {
                    self.stack.push((depth + 1, child));
                }
                return Some((depth, current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loader::Loader;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Loader for Named {
        fn name(&self) -> String {
            self.0.to_string()
        }
        fn defined_packages(&self) -> Vec<String> {
            Vec::new()
        }
        fn parent(&self) -> Option<LoaderRef> {
            None
        }
    }

    fn loader(name: &'static str) -> LoaderRef {
        Arc::new(Named(name))
    }

    #[test]
    fn given_new_tree_when_inspecting_then_only_sentinel_exists() {
        let tree = LoaderTree::new("[root]");
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.get(tree.root()).unwrap().name(), "[root]");
    }

    #[test]
    fn given_existing_child_when_resolving_again_then_reuses_and_keeps_label() {
        let mut tree = LoaderTree::new("[root]");
        let app = loader("app");

        let (first, created) = tree.resolve_child(tree.root(), &app, Some("main"));
        assert!(created);
        let (second, created) = tree.resolve_child(tree.root(), &app, Some("worker"));
        assert!(!created);

        assert_eq!(first, second);
        assert_eq!(tree.get(first).unwrap().label(), Some("main"));
    }

    #[test]
    fn given_two_loaders_with_same_name_when_resolving_then_creates_two_nodes() {
        let mut tree = LoaderTree::new("[root]");
        let (a, _) = tree.resolve_child(tree.root(), &loader("app"), None);
        let (b, _) = tree.resolve_child(tree.root(), &loader("app"), None);

        assert_ne!(a, b);
        assert_eq!(tree.get(tree.root()).unwrap().child_count(), 2);
    }

    #[test]
    fn given_nested_nodes_when_iterating_then_preorder_with_depths() {
        let mut tree = LoaderTree::new("[root]");
        let (boot, _) = tree.resolve_child(tree.root(), &loader("boot"), None);
        let (app, _) = tree.resolve_child(boot, &loader("app"), None);

        let visited: Vec<(usize, String)> = tree
            .iter()
            .map(|(depth, _, node)| (depth, node.name().to_string()))
            .collect();

        assert_eq!(
            visited,
            vec![
                (0, "[root]".to_string()),
                (1, "boot".to_string()),
                (2, "app".to_string())
            ]
        );
        assert_eq!(tree.path_names(app), vec!["[root]", "boot", "app"]);
        assert_eq!(tree.depth(), 3);
    }
}
