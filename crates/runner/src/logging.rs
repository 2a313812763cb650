//! File logging.
//!
//! All `tracing` output goes to an append-only log file through a
//! non-blocking writer. The returned [`WorkerGuard`] flushes pending lines
//! when dropped, so keep it alive until the process is about to exit.

use std::fs::{File, OpenOptions};
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::RunError;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "sqlrunner=info,sqlrunner_core=info,sqlrunner_db=info";

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File, RunError> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| RunError::LogSetup {
            path: path.to_path_buf(),
            source,
        })
}

/// Build a subscriber that writes timestamped, uncoloured lines to `file`.
pub fn file_subscriber(
    file: File,
    filter: EnvFilter,
) -> (impl Subscriber + Send + Sync + 'static, WorkerGuard) {
    let (writer, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_level(true)
            .with_target(false)
            .with_writer(writer),
    );

    (subscriber, guard)
}

/// Install the file subscriber as the global default.
pub fn init(path: &Path) -> Result<WorkerGuard, RunError> {
    let file = open_log_file(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (subscriber, guard) = file_subscriber(file, filter);
    subscriber.init();
    Ok(guard)
}
