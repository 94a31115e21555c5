//! Infrastructure layer: loader chain sources, scheduling and I/O
//!
//! This layer implements the I/O boundary traits and drives iterations.

pub mod agent;
pub mod error;
pub mod host;
pub mod manifest;
pub mod traits;

pub use agent::Agent;
pub use error::{InfraError, InfraResult};
pub use host::{HostRuntime, ModuleLoader};
pub use manifest::ManifestSource;
pub use traits::LoaderChainSource;
