//! Loader hierarchy inspection.
//!
//! Each iteration captures which loader chain every execution unit is bound
//! to, renders it as a fresh tree, and folds it into a cumulative tree that
//! remembers every loader identity ever observed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use loadertree::application::HierarchyService;
//! use loadertree::domain::LoaderRef;
//! use loadertree::infrastructure::{Agent, HostRuntime, ModuleLoader};
//!
//! let runtime = Arc::new(HostRuntime::new());
//! let app = ModuleLoader::new("app", None);
//! app.define_package("com.example");
//! runtime.bind("main", Some(app as LoaderRef)).unwrap();
//!
//! let service = HierarchyService::new(runtime, Box::new(std::io::stdout()));
//! let agent = Agent::start_from_args(Some("maxPackages=3"), service, &mut std::io::stderr()).unwrap();
//! // ... application runs ...
//! agent.shutdown().unwrap();
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
