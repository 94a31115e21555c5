//! I/O boundary traits for testability
//!
//! The host runtime is reached only through these traits, so the iteration
//! service can be tested with in-memory implementations.

use crate::domain::{DomainResult, Snapshot};

/// Yields the current (execution unit, loader chain) pairs of a host runtime.
pub trait LoaderChainSource: Send + Sync {
    /// Captures every execution unit with its leaf-to-root loader chain.
    fn snapshot(&self) -> DomainResult<Snapshot>;
}
