//! Iteration service
//!
//! One iteration takes a single snapshot, renders it as a fresh tree, then
//! folds the same snapshot into the cumulative tree and renders that.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{write_tree, CumulativeTree, Style, TreeBuilder};
use crate::infrastructure::traits::LoaderChainSource;

/// Counts observed during one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationSummary {
    /// 1-based iteration number
    pub iteration: u64,
    pub units: usize,
    /// Nodes in the fresh tree, sentinel included
    pub snapshot_nodes: usize,
    /// Nodes in the cumulative tree after the fold, sentinel included
    pub cumulative_nodes: usize,
}

/// Drives iterations against one source and one cumulative tree.
pub struct HierarchyService {
    source: Arc<dyn LoaderChainSource>,
    cumulative: CumulativeTree,
    builder: TreeBuilder,
    sink: Box<dyn Write + Send>,
    style: Style,
}

impl HierarchyService {
    pub fn new(source: Arc<dyn LoaderChainSource>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            source,
            cumulative: CumulativeTree::new(),
            builder: TreeBuilder::new(),
            sink,
            style: Style::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn cumulative(&self) -> &CumulativeTree {
        &self.cumulative
    }

    /// Runs one iteration, writing both trees to the sink.
    ///
    /// A snapshot failure aborts before anything is written or folded.
    #[instrument(level = "debug", skip(self))]
    pub fn run_iteration(&mut self, max_packages: usize) -> ApplicationResult<IterationSummary> {
        let snapshot = self.source.snapshot()?;
        debug!("snapshot holds {} units", snapshot.len());

        let fresh = self.builder.build(&snapshot);
        write_tree(&fresh, max_packages, self.style, &mut self.sink)
            .map_err(|e| ApplicationError::output("snapshot tree", e))?;

        self.cumulative.fold(&snapshot);
        write_tree(self.cumulative.tree(), max_packages, self.style, &mut self.sink)
            .map_err(|e| ApplicationError::output("cumulative tree", e))?;

        let summary = IterationSummary {
            iteration: self.cumulative.folds(),
            units: snapshot.len(),
            snapshot_nodes: fresh.len(),
            cumulative_nodes: self.cumulative.tree().len(),
        };
        info!(
            iteration = summary.iteration,
            units = summary.units,
            cumulative_nodes = summary.cumulative_nodes,
            "iteration complete"
        );
        Ok(summary)
    }
}
