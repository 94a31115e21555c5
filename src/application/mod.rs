//! Application layer: option parsing and the iteration use case
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod iteration;
pub mod options;

pub use error::{ApplicationError, ApplicationResult};
pub use iteration::{HierarchyService, IterationSummary};
pub use options::{parse_options, OptionError, Options, OptionsReport};
