//! The runner itself: settings, handle, ping, script, batch, close.
//!
//! Each step must succeed before the next starts. The first failure is
//! returned to the caller, which decides how to terminate. Once the database
//! handle exists it is closed on every path, successful or not.

use sqlrunner_core::{load_settings, load_sql_commands, RunnerPaths};
use sqlrunner_db::BatchConnection;

use crate::error::RunError;

/// Logged when the connectivity check fails.
pub const PING_FAILED_MESSAGE: &str = "Error: Could not establish a connection with the database";

pub async fn run(paths: &RunnerPaths) -> Result<(), RunError> {
    let settings = load_settings(&paths.config).map_err(RunError::Settings)?;

    let handle =
        sqlrunner_db::create_handle(&settings.postgres_connection).map_err(RunError::Connect)?;

    run_with(handle, paths).await
}

/// Drive an already constructed handle through ping, script, batch and close.
pub async fn run_with<C: BatchConnection>(mut conn: C, paths: &RunnerPaths) -> Result<(), RunError> {
    let outcome = ping_and_execute(&mut conn, paths).await;
    let closed = conn.close().await;

    if let Err(e) = outcome {
        if let Err(close_err) = closed {
            tracing::warn!(error = %close_err, "Failed to close the database connection");
        }
        return Err(e);
    }
    closed.map_err(RunError::Close)?;

    tracing::info!("SQL Commands executed.");
    Ok(())
}

async fn ping_and_execute<C: BatchConnection>(
    conn: &mut C,
    paths: &RunnerPaths,
) -> Result<(), RunError> {
    if let Err(e) = conn.ping().await {
        tracing::error!(error = %e, "{PING_FAILED_MESSAGE}");
        return Err(RunError::Ping(e));
    }

    tracing::info!("Executing SQL commands...");
    let commands = load_sql_commands(&paths.script).map_err(RunError::Script)?;

    let rows_affected = conn
        .execute_batch(&commands)
        .await
        .map_err(RunError::Execute)?;
    tracing::debug!(rows_affected, "Batch finished");

    tracing::info!("Done");
    Ok(())
}
