//! Locations of the three files the runner works with.
//!
//! # Environment variables
//!
//! | Variable           | Default          | Description                     |
//! |--------------------|------------------|---------------------------------|
//! | `SQLRUNNER_CONFIG` | `sqlrunner.json` | JSON settings file              |
//! | `SQLRUNNER_SCRIPT` | `commands.sql`   | SQL script submitted as a batch |
//! | `SQLRUNNER_LOG`    | `runner.log`     | Append-only log file            |
//!
//! Relative paths resolve against the working directory.

use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "sqlrunner.json";
pub const DEFAULT_SCRIPT_FILE: &str = "commands.sql";
pub const DEFAULT_LOG_FILE: &str = "runner.log";

pub const CONFIG_ENV: &str = "SQLRUNNER_CONFIG";
pub const SCRIPT_ENV: &str = "SQLRUNNER_SCRIPT";
pub const LOG_ENV: &str = "SQLRUNNER_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerPaths {
    pub config: PathBuf,
    pub script: PathBuf,
    pub log: PathBuf,
}

impl Default for RunnerPaths {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            script: PathBuf::from(DEFAULT_SCRIPT_FILE),
            log: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl RunnerPaths {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build paths from an arbitrary key lookup. Unset or empty values fall
    /// back to the fixed file names.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            config: pick(CONFIG_ENV, DEFAULT_CONFIG_FILE),
            script: pick(SCRIPT_ENV, DEFAULT_SCRIPT_FILE),
            log: pick(LOG_ENV, DEFAULT_LOG_FILE),
        }
    }
}
