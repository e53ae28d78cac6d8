// Copyright (c) 2024 The Hierarchical TEE Authors

//! Logging utilities built on `slog`.
//!
//! Library crates only depend on the [`Logger`] type and the [`log`] macros.
//! Binaries and tests enable the `loggers` feature to get drains that write to
//! the terminal.

pub use slog::{o, Discard, Drain, FnValue, Key, Level, Logger, PushFnValue, Record};

/// Logging macros, used as `log::info!(logger, "...")`.
pub mod log {
    pub use slog::{crit, debug, error, info, trace, warn};
}

/// Create a logger that discards everything.
///
/// Useful for library callers that do not care about log output.
pub fn create_null_logger() -> Logger {
    Logger::root(Discard, o!())
}

#[cfg(feature = "loggers")]
mod loggers;

#[cfg(feature = "loggers")]
pub use loggers::*;
