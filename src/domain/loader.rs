//! Loader abstraction: identity-bearing handles owned by the host runtime.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::error::{DomainError, DomainResult};

/// A runtime entity owning a set of named packages, with zero or one parent.
pub trait Loader: Send + Sync + fmt::Debug {
    /// Display name. Not unique: identity comes from the handle, not the name.
    fn name(&self) -> String;

    /// Currently defined package names, in the host's enumeration order.
    fn defined_packages(&self) -> Vec<String>;

    fn parent(&self) -> Option<LoaderRef>;
}

/// Shared handle to a live loader.
pub type LoaderRef = Arc<dyn Loader>;

/// Reference identity of a loader handle.
///
/// Derived from the allocation address, so it stays valid only while some
/// clone of the handle is alive. Trees keep such a clone for every key they
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderKey(usize);

impl LoaderKey {
    pub fn of(loader: &LoaderRef) -> Self {
        Self(Arc::as_ptr(loader) as *const () as usize)
    }
}

impl fmt::Display for LoaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One execution unit together with its loader chain (leaf first, root last).
#[derive(Debug, Clone)]
pub struct UnitChain {
    /// Plain label of the execution unit; never a live handle to it
    pub unit: String,
    pub chain: Vec<LoaderRef>,
}

impl UnitChain {
    pub fn new(unit: impl Into<String>, chain: Vec<LoaderRef>) -> Self {
        Self {
            unit: unit.into(),
            chain,
        }
    }

    /// Builds the chain by walking parent links up from `leaf`.
    pub fn from_leaf(unit: impl Into<String>, leaf: Option<LoaderRef>) -> DomainResult<Self> {
        let unit = unit.into();
        let chain = match leaf {
            Some(leaf) => chain_from_leaf(&unit, leaf)?,
            None => Vec::new(),
        };
        Ok(Self { unit, chain })
    }
}

/// All (execution unit, loader chain) pairs captured at one point in time.
///
/// Each chain is internally consistent; different chains may reflect
/// slightly different instants.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub units: Vec<UnitChain>,
}

impl Snapshot {
    pub fn new(units: Vec<UnitChain>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl FromIterator<UnitChain> for Snapshot {
    fn from_iter<I: IntoIterator<Item = UnitChain>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

/// Walks `parent()` links from `leaf` to the outermost ancestor.
///
/// Index 0 is the leaf, the last index the root. A loader that shows up twice
/// means the parent links form a cycle.
pub fn chain_from_leaf(unit: &str, leaf: LoaderRef) -> DomainResult<Vec<LoaderRef>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(leaf);

    while let Some(loader) = current {
        if !seen.insert(LoaderKey::of(&loader)) {
            return Err(DomainError::CyclicChain {
                unit: unit.to_string(),
                loader: loader.name(),
            });
        }
        current = loader.parent();
        chain.push(loader);
    }

    Ok(chain)
}
