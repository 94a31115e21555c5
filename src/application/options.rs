//! Option string parsing: `maxPackages=10,every=30`
//!
//! Bad tokens are reported one by one and skipped; parsing always yields
//! usable options.

use std::io::{self, Write};
use std::num::ParseIntError;

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_PACKAGES: usize = 5;
pub const DEFAULT_EVERY_N_SECONDS: u64 = 0;

pub const KEY_MAX_PACKAGES: &str = "maxPackages";
pub const KEY_EVERY: &str = "every";

pub const USAGE: &str = "\
Usage: loadertree <command> --options maxPackages=5,every=0
  maxPackages: maximum number of packages to print per loader
  every: print the hierarchy every N seconds (0 to disable)";

/// Effective options of one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub max_packages: usize,
    /// Period of scheduled iterations; 0 disables them
    pub every_n_seconds: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_packages: DEFAULT_MAX_PACKAGES,
            every_n_seconds: DEFAULT_EVERY_N_SECONDS,
        }
    }
}

/// A single rejected token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("Invalid argument: {token}")]
    Malformed { token: String },

    #[error("Invalid argument: {token}")]
    UnknownKey { token: String, key: String },

    #[error("Invalid argument: {token}")]
    InvalidValue {
        token: String,
        key: String,
        #[source]
        source: ParseIntError,
    },
}

impl OptionError {
    pub fn token(&self) -> &str {
        match self {
            Self::Malformed { token }
            | Self::UnknownKey { token, .. }
            | Self::InvalidValue { token, .. } => token,
        }
    }
}

/// Parsed options plus every token that had to be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionsReport {
    pub options: Options,
    pub errors: Vec<OptionError>,
}

impl OptionsReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Writes one line per rejected token, then the usage text once.
    pub fn write_errors(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        for error in &self.errors {
            writeln!(out, "{}", error)?;
        }
        writeln!(out, "{}", USAGE)
    }
}

/// Parses a comma separated list of `key=value` tokens.
///
/// Later valid tokens override earlier ones. A missing or blank input gives
/// the defaults; empty tokens between commas are ignored.
pub fn parse_options(input: Option<&str>) -> OptionsReport {
    let mut report = OptionsReport::default();
    let Some(input) = input else {
        return report;
    };

    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Err(e) = apply_token(&mut report.options, token) {
            debug!("skipping option token '{}': {:?}", token, e);
            report.errors.push(e);
        }
    }
    report
}

fn apply_token(options: &mut Options, token: &str) -> Result<(), OptionError> {
    let parts: Vec<&str> = token.split('=').collect();
    let [key, value] = parts.as_slice() else {
        return Err(OptionError::Malformed {
            token: token.to_string(),
        });
    };

    let invalid = |source: ParseIntError| OptionError::InvalidValue {
        token: token.to_string(),
        key: key.to_string(),
        source,
    };
    match *key {
        KEY_MAX_PACKAGES => options.max_packages = value.parse().map_err(invalid)?,
        KEY_EVERY => options.every_n_seconds = value.parse().map_err(invalid)?,
        _ => {
            return Err(OptionError::UnknownKey {
                token: token.to_string(),
                key: key.to_string(),
            })
        }
    }
    Ok(())
}
