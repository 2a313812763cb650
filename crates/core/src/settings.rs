//! Runner settings loaded from the JSON settings file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;

/// Prepended to every connection string read from the settings file.
pub const SSL_DISABLE_PREFIX: &str = "sslmode=disable ";

/// Contents of `sqlrunner.json`.
///
/// Unknown fields are ignored. A missing `postgres_connection` yields an empty
/// string rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub postgres_connection: String,
}

impl Settings {
    /// Parse settings from raw JSON without touching the connection string.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    fn disable_ssl(mut self) -> Self {
        self.postgres_connection.insert_str(0, SSL_DISABLE_PREFIX);
        self
    }
}

/// Load the settings file and compose the connection string.
///
/// The returned [`Settings`] already carries the [`SSL_DISABLE_PREFIX`]; callers
/// must not add it again.
pub fn load_settings(path: &Path) -> Result<Settings, CoreError> {
    let bytes = fs::read(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let settings = Settings::from_json(&bytes).map_err(|source| CoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "Settings loaded");
    Ok(settings.disable_ssl())
}
