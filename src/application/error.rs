//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("write {context}: {source}")]
    Output {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApplicationError {
    pub fn output(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            context: context.into(),
            source,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
