//! `sqlrunner` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod error;
pub mod logging;
pub mod pipeline;

pub use error::RunError;
