//! PostgreSQL access for the runner: build a lazy single-connection handle,
//! ping it, submit a script as one batch, and close it.
//!
//! The handle owns at most one [`PgConnection`]. It is opened by the first
//! ping with a single connect attempt; a refused or failed connect is
//! reported as is.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

pub mod dsn;
pub mod error;

pub use dsn::DsnParams;
pub use error::{DbError, DsnError};

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// The three operations the runner performs against a database.
#[async_trait]
pub trait BatchConnection: Send {
    /// Liveness check. Opens the connection if it is not open yet.
    async fn ping(&mut self) -> Result<(), DbError>;

    /// Submit `sql` in a single request. Returns the rows affected.
    async fn execute_batch(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Release the connection. Closing a handle that never connected is a
    /// no-op.
    async fn close(&mut self) -> Result<(), DbError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL handle
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DbHandle {
    options: PgConnectOptions,
    connect_timeout: Option<Duration>,
    conn: Option<PgConnection>,
}

/// Build a connection handle from a keyword/value connection string.
///
/// Nothing is sent to the server here; only the string itself is validated.
pub fn create_handle(connection_string: &str) -> Result<DbHandle, DbError> {
    let params = DsnParams::parse(connection_string)?;
    let handle = DbHandle::new(params.to_connect_options()?, params.connect_timeout()?);

    tracing::debug!(dsn = %params, "Database handle created");
    Ok(handle)
}

impl DbHandle {
    pub fn new(options: PgConnectOptions, connect_timeout: Option<Duration>) -> Self {
        Self {
            options,
            connect_timeout,
            conn: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn connection(&mut self) -> Result<&mut PgConnection, DbError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let connect = PgConnection::connect_with(&self.options);
                let connected = match self.connect_timeout {
                    Some(limit) => tokio::time::timeout(limit, connect)
                        .await
                        .map_err(|_| DbError::ConnectTimeout(limit))?,
                    None => connect.await,
                };
                connected.map_err(DbError::Ping)?
            }
        };
        Ok(self.conn.insert(conn))
    }
}

#[async_trait]
impl BatchConnection for DbHandle {
    async fn ping(&mut self) -> Result<(), DbError> {
        self.connection().await?.ping().await.map_err(DbError::Ping)
    }

    /// The simple query protocol is used, so the server splits and runs
    /// multiple statements in order. No transaction is opened here.
    async fn execute_batch(&mut self, sql: &str) -> Result<u64, DbError> {
        let conn = self.connection().await?;
        let result = sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(DbError::Execute)?;
        Ok(result.rows_affected())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        match self.conn.take() {
            Some(conn) => conn.close().await.map_err(DbError::Close),
            None => Ok(()),
        }
    }
}
