//! In-process loader registry
//!
//! Applications that manage their own module loaders register them here and
//! bind execution units to leaf loaders. The registry then acts as the loader
//! chain source for the agent.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::thread;

use tracing::{debug, instrument};

use crate::domain::{DomainError, DomainResult, Loader, LoaderRef, Snapshot, UnitChain};
use crate::infrastructure::traits::LoaderChainSource;

/// Loader with a fixed parent and a mutable set of defined packages.
#[derive(Debug)]
pub struct ModuleLoader {
    name: String,
    parent: Option<LoaderRef>,
    /// Definition order is kept: it is the enumeration order seen by snapshots
    packages: RwLock<Vec<String>>,
}

impl ModuleLoader {
    pub fn new(name: impl Into<String>, parent: Option<LoaderRef>) -> Arc<Self> {
        Self::with_packages(name, parent, Vec::new())
    }

    pub fn with_packages(
        name: impl Into<String>,
        parent: Option<LoaderRef>,
        packages: Vec<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent,
            packages: RwLock::new(packages),
        })
    }

    /// Defines a package; defining it twice is a no-op.
    pub fn define_package(&self, package: impl Into<String>) {
        let package = package.into();
        let mut packages = self.packages.write().unwrap_or_else(|p| p.into_inner());
        if !packages.contains(&package) {
            packages.push(package);
        }
    }

    pub fn undefine_package(&self, package: &str) {
        let mut packages = self.packages.write().unwrap_or_else(|p| p.into_inner());
        packages.retain(|p| p != package);
    }

    /// Replaces the whole package set.
    pub fn set_packages(&self, new_packages: Vec<String>) {
        let mut packages = self.packages.write().unwrap_or_else(|p| p.into_inner());
        *packages = new_packages;
    }

    pub fn parent_ref(&self) -> Option<&LoaderRef> {
        self.parent.as_ref()
    }
}

impl Loader for ModuleLoader {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn defined_packages(&self) -> Vec<String> {
        self.packages
            .read()
            .map(|p| p.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }

    fn parent(&self) -> Option<LoaderRef> {
        self.parent.clone()
    }
}

/// Registry of execution units and their current leaf loaders.
#[derive(Debug, Default)]
pub struct HostRuntime {
    units: RwLock<BTreeMap<String, Option<LoaderRef>>>,
}

impl HostRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `unit` to `loader`, replacing any previous binding.
    ///
    /// A unit bound to `None` is still reported, with an empty chain.
    pub fn bind(&self, unit: impl Into<String>, loader: Option<LoaderRef>) -> DomainResult<()> {
        let unit = unit.into();
        debug!("bind unit '{}'", unit);
        self.units
            .write()
            .map_err(|_| DomainError::SourceUnavailable("unit registry poisoned".into()))?
            .insert(unit, loader);
        Ok(())
    }

    /// Binds the calling thread under its name, or its id if unnamed.
    pub fn bind_current_thread(&self, loader: Option<LoaderRef>) -> DomainResult<String> {
        let current = thread::current();
        let label = current
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", current.id()));
        self.bind(label.clone(), loader)?;
        Ok(label)
    }

    /// Removes `unit`; returns whether it was bound.
    pub fn unbind(&self, unit: &str) -> DomainResult<bool> {
        Ok(self
            .units
            .write()
            .map_err(|_| DomainError::SourceUnavailable("unit registry poisoned".into()))?
            .remove(unit)
            .is_some())
    }

    pub fn unit_count(&self) -> usize {
        self.units.read().map(|u| u.len()).unwrap_or(0)
    }
}

impl LoaderChainSource for HostRuntime {
    #[instrument(level = "trace", skip(self))]
    fn snapshot(&self) -> DomainResult<Snapshot> {
        let units = self
            .units
            .read()
            .map_err(|_| DomainError::SourceUnavailable("unit registry poisoned".into()))?;
        units
            .iter()
            .map(|(unit, leaf)| UnitChain::from_leaf(unit.clone(), leaf.clone()))
            .collect::<DomainResult<Vec<_>>>()
            .map(Snapshot::new)
    }
}
