//! Cumulative accumulator: one persistent tree for the whole process life.

use tracing::{debug, instrument};

use crate::domain::arena::LoaderTree;
use crate::domain::builder::TreeBuilder;
use crate::domain::loader::Snapshot;

/// Sentinel name of the persistent tree.
pub const CUMULATIVE_ROOT: &str = "[cumulative]";

/// Persistent tree merging every snapshot folded into it.
///
/// Nodes are never removed, so the node set only grows. Each node keeps a
/// clone of its loader handle: a loader once observed here is not released by
/// the host for as long as the accumulator lives, even after no execution
/// unit references it anymore.
///
/// There is no internal locking. Whoever drives iterations must not fold two
/// snapshots concurrently.
#[derive(Debug)]
pub struct CumulativeTree {
    tree: LoaderTree,
    builder: TreeBuilder,
    folds: u64,
}

impl Default for CumulativeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CumulativeTree {
    pub fn new() -> Self {
        Self {
            tree: LoaderTree::new(CUMULATIVE_ROOT),
            builder: TreeBuilder::new(),
            folds: 0,
        }
    }

    /// Folds `snapshot` into the persistent tree.
    ///
    /// Known identities are reused and refreshed, new ones become permanent
    /// branches.
    #[instrument(level = "debug", skip_all, fields(fold = self.folds + 1))]
    pub fn fold(&mut self, snapshot: &Snapshot) {
        let before = self.tree.len();
        self.builder.fold_snapshot(&mut self.tree, snapshot);
        self.folds += 1;
        debug!(
            "cumulative tree grew by {} nodes to {}",
            self.tree.len() - before,
            self.tree.len()
        );
    }

    pub fn tree(&self) -> &LoaderTree {
        &self.tree
    }

    /// Number of snapshots folded so far.
    pub fn folds(&self) -> u64 {
        self.folds
    }
}
