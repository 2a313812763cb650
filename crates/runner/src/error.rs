use std::path::PathBuf;

use sqlrunner_core::CoreError;
use sqlrunner_db::DbError;

/// A fatal failure, tagged with the pipeline step that produced it.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Could not open log file {}: {source}", .path.display())]
    LogSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading settings: {0}")]
    Settings(#[source] CoreError),

    #[error("Error creating database handle: {0}")]
    Connect(#[source] DbError),

    #[error("{0}")]
    Ping(#[source] DbError),

    #[error("Error loading SQL commands file: {0}")]
    Script(#[source] CoreError),

    #[error("{0}")]
    Execute(#[source] DbError),

    #[error("{0}")]
    Close(#[source] DbError),
}
