//! Shared building blocks for the SQL runner: file locations, the settings
//! file, and the SQL script loader.

pub mod error;
pub mod paths;
pub mod script;
pub mod settings;

pub use error::CoreError;
pub use paths::RunnerPaths;
pub use script::load_sql_commands;
pub use settings::{load_settings, Settings, SSL_DISABLE_PREFIX};
