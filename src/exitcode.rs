//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (bad manifest)
pub const DATAERR: i32 = 65;

/// Loader chain source unavailable
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// System error (e.g., signal handler setup)
pub const OSERR: i32 = 71;

/// Input/output error
pub const IOERR: i32 = 74;
