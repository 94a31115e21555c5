//! Manifest-backed loader chain source
//!
//! Describes a host runtime in TOML and re-reads it on every snapshot:
//!
//! ```toml
//! [[loader]]
//! id = "platform"
//! packages = ["java.sql"]
//!
//! [[loader]]
//! id = "app"
//! name = "app"
//! parent = "platform"
//! packages = ["com.example", "com.example.util"]
//!
//! [[thread]]
//! name = "main"
//! loader = "app"
//! ```
//!
//! Loader instances are cached by `id`, so an unchanged declaration keeps its
//! identity across reads and only its packages are replaced.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{DomainError, DomainResult, LoaderKey, LoaderRef, Snapshot, UnitChain};
use crate::infrastructure::host::ModuleLoader;
use crate::infrastructure::traits::LoaderChainSource;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "loader")]
    pub loaders: Vec<LoaderSpec>,
    #[serde(default, rename = "thread")]
    pub threads: Vec<ThreadSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderSpec {
    pub id: String,
    /// Display name, defaults to `id`
    pub name: Option<String>,
    pub parent: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
}

impl LoaderSpec {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadSpec {
    pub name: String,
    /// Leaf loader id; absent means the unit has no loader
    pub loader: Option<String>,
}

/// Loader chain source reading a TOML manifest.
#[derive(Debug)]
pub struct ManifestSource {
    path: PathBuf,
    cache: Mutex<HashMap<String, Arc<ModuleLoader>>>,
}

impl ManifestSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invalid(&self, message: impl Into<String>) -> DomainError {
        DomainError::InvalidManifest {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn load(&self) -> DomainResult<Manifest> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| self.invalid(format!("read: {}", e)))?;
        toml::from_str(&content).map_err(|e| self.invalid(format!("parse: {}", e)))
    }
}

impl LoaderChainSource for ManifestSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn snapshot(&self) -> DomainResult<Snapshot> {
        let manifest = self.load()?;

        let mut declared: HashMap<&str, &LoaderSpec> = HashMap::new();
        for spec in &manifest.loaders {
            if declared.insert(spec.id.as_str(), spec).is_some() {
                return Err(self.invalid(format!("duplicate loader id '{}'", spec.id)));
            }
        }

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| DomainError::SourceUnavailable("manifest cache poisoned".into()))?;
        let mut resolver = Resolver {
            source: self,
            declared: &declared,
            previous: &*cache,
            resolved: HashMap::new(),
            visiting: HashSet::new(),
        };
        for spec in &manifest.loaders {
            resolver.resolve(&spec.id)?;
        }

        let mut units = Vec::with_capacity(manifest.threads.len());
        for thread in &manifest.threads {
            let leaf: Option<LoaderRef> = match &thread.loader {
                Some(id) => {
                    let loader = resolver.resolved.get(id).cloned().ok_or_else(|| {
                        DomainError::UnknownLoader {
                            unit: thread.name.clone(),
                            id: id.clone(),
                        }
                    })?;
                    Some(loader as LoaderRef)
                }
                None => None,
            };
            units.push(UnitChain::from_leaf(thread.name.clone(), leaf)?);
        }

        let resolved = resolver.resolved;
        debug!("manifest declares {} loaders, {} units", resolved.len(), units.len());
        *cache = resolved;
        Ok(Snapshot::new(units))
    }
}

/// Turns loader declarations into live instances, parents first.
struct Resolver<'a> {
    source: &'a ManifestSource,
    declared: &'a HashMap<&'a str, &'a LoaderSpec>,
    previous: &'a HashMap<String, Arc<ModuleLoader>>,
    resolved: HashMap<String, Arc<ModuleLoader>>,
    visiting: HashSet<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, id: &str) -> DomainResult<Arc<ModuleLoader>> {
        if let Some(done) = self.resolved.get(id) {
            return Ok(done.clone());
        }
        if !self.visiting.insert(id.to_string()) {
            return Err(self.source.invalid(format!("parent cycle at loader '{}'", id)));
        }

        let declared = self.declared;
        let spec = *declared
            .get(id)
            .ok_or_else(|| self.source.invalid(format!("unknown loader '{}'", id)))?;
        let parent: Option<LoaderRef> = match &spec.parent {
            Some(parent_id) => Some(self.resolve(parent_id)? as LoaderRef),
            None => None,
        };

        let loader = match self.previous.get(id) {
            Some(cached) if Self::same_shape(cached, spec, parent.as_ref()) => {
                cached.set_packages(spec.packages.clone());
                cached.clone()
            }
            _ => {
                debug!("new identity for loader '{}'", id);
                ModuleLoader::with_packages(spec.display_name(), parent, spec.packages.clone())
            }
        };

        self.visiting.remove(id);
        self.resolved.insert(id.to_string(), loader.clone());
        Ok(loader)
    }

    /// A cached instance survives when its name and parent identity match.
    fn same_shape(cached: &ModuleLoader, spec: &LoaderSpec, parent: Option<&LoaderRef>) -> bool {
        use crate::domain::Loader;

        let parent_matches = match (cached.parent_ref(), parent) {
            (None, None) => true,
            (Some(a), Some(b)) => LoaderKey::of(a) == LoaderKey::of(b),
            _ => false,
        };
        parent_matches && cached.name() == spec.display_name()
    }
}
