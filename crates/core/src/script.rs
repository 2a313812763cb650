use std::fs;
use std::path::Path;

use crate::error::CoreError;

/// Read the SQL script verbatim.
///
/// No statement splitting or comment stripping happens here; the database
/// receives exactly what is on disk.
pub fn load_sql_commands(path: &Path) -> Result<String, CoreError> {
    let bytes = fs::read(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let commands = String::from_utf8(bytes).map_err(|source| CoreError::InvalidUtf8 {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = commands.len(), "SQL commands loaded");
    Ok(commands)
}
