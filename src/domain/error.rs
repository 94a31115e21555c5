//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors are snapshot failures.
/// They abort the iteration in progress and nothing else.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("loader chain source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("cyclic loader chain for unit '{unit}' at loader '{loader}'")]
    CyclicChain { unit: String, loader: String },

    #[error("unit '{unit}' references unknown loader '{id}'")]
    UnknownLoader { unit: String, id: String },

    #[error("invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
