//! Snapshot folding: merges loader chains into an identity-keyed tree.

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::LoaderTree;
use crate::domain::loader::{Loader, LoaderRef, Snapshot, UnitChain};

/// Sentinel name of a fresh per-snapshot tree.
pub const SNAPSHOT_ROOT: &str = "[root]";

/// Folds snapshots into loader trees.
///
/// Each chain is walked from its root-most loader toward its leaf. Chains that
/// share an ancestor prefix end up on one shared branch.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds a fresh `[root]` tree from one snapshot.
    #[instrument(level = "debug", skip_all, fields(units = snapshot.len()))]
    pub fn build(&self, snapshot: &Snapshot) -> LoaderTree {
        let mut tree = LoaderTree::new(SNAPSHOT_ROOT);
        self.fold_snapshot(&mut tree, snapshot);
        tree
    }

    /// Merges every chain of `snapshot` into `tree`.
    #[instrument(level = "debug", skip_all, fields(units = snapshot.len()))]
    pub fn fold_snapshot(&self, tree: &mut LoaderTree, snapshot: &Snapshot) {
        for unit in &snapshot.units {
            self.fold_unit(tree, unit);
        }
        debug!("tree holds {} nodes", tree.len());
    }

    pub fn fold_unit(&self, tree: &mut LoaderTree, unit: &UnitChain) {
        self.fold_chain(tree, &unit.unit, &unit.chain);
    }

    /// Merges one leaf-to-root `chain` into `tree`.
    ///
    /// Only the outermost step carries `unit` as label, so a label can land on
    /// the node of the chain's root-most loader and nowhere deeper. Every
    /// visited node gets its packages refreshed, created or not.
    pub fn fold_chain(&self, tree: &mut LoaderTree, unit: &str, chain: &[LoaderRef]) {
        let mut position = tree.root();
        let mut label = Some(unit);

        for loader in chain.iter().rev() {
            let (child, created) = tree.resolve_child(position, loader, label);
            if created {
                trace!(loader = %loader.name(), ?label, "created node");
            }
            refresh_packages(tree, child, loader.as_ref());
            label = None;
            position = child;
        }
    }
}

/// Replaces the node's packages with the loader's current ones, ordered by
/// segment count.
pub fn refresh_packages(tree: &mut LoaderTree, idx: Index, loader: &dyn Loader) {
    tree.replace_packages(idx, sort_by_segments(loader.defined_packages()));
}

/// Stable sort by number of dot-separated segments: `a`, `a.b`, `a.b.c`.
///
/// Names with equal segment counts keep their incoming order.
pub fn sort_by_segments(mut packages: Vec<String>) -> Vec<String> {
    packages.sort_by_key(|name| name.split('.').count());
    packages
}
