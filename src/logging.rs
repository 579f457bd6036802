//! Logging bootstrap.
//!
//! The rest of the crate only ever calls into `tracing`'s call sites
//! (`info!`, `warn!`, `error!`, `debug!`); this module is the only place
//! that knows how those calls are drained. A non-blocking file appender
//! plus a stdout layer gives the single-draining-thread, non-blocking-
//! producer contract the reactor depends on — logging must never block
//! a reactor thread.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Guard returned by [`init`]; drop it (at process exit) to flush the
/// background appender.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global tracing subscriber.
///
/// `log_dir` is optional: when set, logs are additionally written to a
/// rolling daily file under that directory, on a background thread.
/// Filtering is driven by `RUST_LOG`, defaulting to `info`.
pub fn init(log_dir: Option<&std::path::Path>) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "longlp-server.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(non_blocking.and(std::io::stdout))
                .with_ansi(false);

            tracing_subscriber::registry().with(filter).with(layer).init();

            LogGuard { _file_guard: Some(guard) }
        }
        None => {
            let layer = tracing_subscriber::fmt::layer().with_target(true);
            tracing_subscriber::registry().with(filter).with(layer).init();

            LogGuard { _file_guard: None }
        }
    }
}
