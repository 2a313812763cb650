use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid connection string: {0}")]
    Dsn(#[from] DsnError),

    #[error("Could not establish a connection with the database: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("Could not establish a connection with the database: timed out after {}s", .0.as_secs())]
    ConnectTimeout(Duration),

    #[error("SQL execution failed: {0}")]
    Execute(#[source] sqlx::Error),

    #[error("Failed to close the database connection: {0}")]
    Close(#[source] sqlx::Error),
}

/// Reasons a keyword/value connection string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DsnError {
    #[error("missing \"=\" after \"{0}\"")]
    MissingEquals(String),

    #[error("empty keyword before \"=\"")]
    EmptyKeyword,

    #[error("unterminated quoted value for \"{0}\"")]
    UnterminatedQuote(String),

    #[error("invalid port \"{0}\"")]
    InvalidPort(String),

    #[error("invalid sslmode \"{0}\"")]
    InvalidSslMode(String),

    #[error("invalid connect_timeout \"{0}\"")]
    InvalidTimeout(String),

    #[error("unsupported entry \"{0}\" in options; expected -c key=value")]
    InvalidOptions(String),
}
