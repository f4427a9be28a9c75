//! Logger initialization.
//!
//! Everything logs through the `log` facade; this installs `env_logger`
//! behind it once per process.

mod init;

pub use init::{init_logging, init_logging_verbose, LoggingConfig};
