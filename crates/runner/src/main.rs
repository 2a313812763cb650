//! `sqlrunner` -- apply a SQL script to a PostgreSQL database.
//!
//! Reads the connection string from `sqlrunner.json`, pings the server,
//! submits `commands.sql` as a single batch and logs to `runner.log`.
//! File locations can be overridden through the environment; see
//! [`sqlrunner_core::paths`].
//!
//! Exits with status 0 on success and 1 on any failure.

use std::process::ExitCode;

use sqlrunner::{logging, pipeline};
use sqlrunner_core::RunnerPaths;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    println!("SQL Runner");

    let paths = RunnerPaths::from_env();

    // Dropped at the end of `main`, which flushes the log file.
    let _log_guard = match logging::init(&paths.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        config = %paths.config.display(),
        script = %paths.script.display(),
        "Starting sqlrunner",
    );

    match pipeline::run(&paths).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "sqlrunner aborted");
            ExitCode::FAILURE
        }
    }
}
