// Copyright (c) 2024 The Hierarchical TEE Authors

/// Sets chan_size for the stdout and stderr loggers
const STDOUT_CHANNEL_SIZE: usize = 100_000;
const STDERR_CHANNEL_SIZE: usize = 100_000;

/// Macros to ease with tests that require a Logger instance.
pub use ht_util_logger_macros::test_with_logger;

pub use slog_scope;

use super::*;

use chrono::Utc;
use std::{env, io};

/// Custom timestamp function for use with slog-term
fn custom_timestamp(io: &mut dyn io::Write) -> io::Result<()> {
    write!(io, "{}", Utc::now())
}

/// Create a basic stdout logger.
fn create_stdout_logger() -> slog::Fuse<slog_async::Async> {
    let decorator = slog_term::TermDecorator::new().stdout().build();
    let drain = slog_envlogger::new(
        slog_term::FullFormat::new(decorator)
            .use_custom_timestamp(custom_timestamp)
            .build()
            .fuse(),
    );
    slog_async::Async::new(drain)
        .thread_name("slog-stdout".into())
        .chan_size(STDOUT_CHANNEL_SIZE)
        .build()
        .fuse()
}

/// Create a basic stderr logger.
fn create_stderr_logger() -> slog::Fuse<slog_async::Async> {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_envlogger::new(
        slog_term::FullFormat::new(decorator)
            .use_custom_timestamp(custom_timestamp)
            .build()
            .fuse(),
    );
    slog_async::Async::new(drain)
        .thread_name("slog-stderr".into())
        .chan_size(STDERR_CHANNEL_SIZE)
        .build()
        .fuse()
}

/// Create the root logger, which logs to stdout, or to stderr when
/// `HT_LOG_STDERR=1`.
pub fn create_root_logger() -> Logger {
    // Support HT_LOG in addition to RUST_LOG, so that cargo's own output is not
    // affected when doing stuff like HT_LOG=trace cargo test -p ...
    if env::var("RUST_LOG").is_err() {
        let level = env::var("HT_LOG").unwrap_or_else(|_| "info".to_string());
        env::set_var("RUST_LOG", level);
    }

    let std_logger = if env::var("HT_LOG_STDERR") == Ok("1".to_string()) {
        create_stderr_logger()
    } else {
        create_stdout_logger()
    };

    // Extra context that always gets added to each log message.
    let extra_kv = o!(
        "ht.src" => SrcValue {},
        "ht.module" => ModuleValue {},
    );

    Logger::root(std_logger, extra_kv)
}

/// Create a logger that is suitable for use during test execution.
pub fn create_test_logger(test_name: String) -> Logger {
    // Tests log to stderr by default.
    if env::var("HT_LOG_STDERR").is_err() {
        env::set_var("HT_LOG_STDERR", "1");
    }
    create_root_logger().new(o!(
        "ht.test_name" => test_name,
    ))
}

/// Create an application logger (to be used by our binary crates).
///
/// The returned guard keeps the global `slog-scope` logger installed; it must
/// be held for the lifetime of the program.
pub fn create_app_logger<T: slog::SendSyncRefUnwindSafeKV + 'static>(
    values: slog::OwnedKV<T>,
) -> (Logger, slog_scope::GlobalLoggerGuard) {
    let current_exe = env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    let app_logger = create_root_logger()
        .new(o!(
            "ht.app" => current_exe.clone(),
        ))
        .new(values);
    let guard = slog_scope::set_global_logger(app_logger.clone());
    // Route the `log` crate facade into slog. A second registration only
    // happens in tests and is harmless.
    let _ = slog_stdlog::init();

    log::info!(
        app_logger,
        "{} {} started",
        current_exe,
        env!("CARGO_PKG_VERSION")
    );

    (app_logger, guard)
}

struct SrcValue;
impl slog::Value for SrcValue {
    fn serialize(
        &self,
        record: &slog::Record,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, &format!("{}:{}", record.file(), record.line()))
    }
}

struct ModuleValue;
impl slog::Value for ModuleValue {
    fn serialize(
        &self,
        record: &slog::Record,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, record.module())
    }
}
