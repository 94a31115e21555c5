//! Domain layer: loader trees and the folding that builds them
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod cumulative;
pub mod error;
pub mod loader;
pub mod render;

pub use arena::{LoaderTree, TreeNode};
pub use builder::{refresh_packages, sort_by_segments, TreeBuilder, SNAPSHOT_ROOT};
pub use cumulative::{CumulativeTree, CUMULATIVE_ROOT};
pub use error::{DomainError, DomainResult};
pub use loader::{chain_from_leaf, Loader, LoaderKey, LoaderRef, Snapshot, UnitChain};
pub use render::{render_lines, write_tree, Style};
