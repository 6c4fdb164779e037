//! Logging bootstrap for the CLI binaries: `slog` + `slog-term` +
//! `slog-async`, bridged to the `log` facade the rest of the workspace logs
//! through via `slog-scope` + `slog-stdlog`, matching
//! `flotsync_io_examples`'s dependency set.

use slog::Drain;

/// Installs the global logger. Keep the returned guard alive for the
/// process's lifetime — dropping it restores the no-op logger.
pub fn init() -> slog_scope::GlobalLoggerGuard {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let logger = slog::Logger::root(drain, slog::o!());

    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init().expect("failed to bridge the log facade to slog");
    guard
}
