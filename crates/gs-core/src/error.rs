//! Error types for gammasens

use thiserror::Error;

/// gammasens error type
///
/// Only conditions that make a whole run meaningless are errors. A grid
/// candidate without enough statistics, or a Monte-Carlo trial that cannot
/// reach the target significance, is reported as data instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid analysis configuration (empty grid, non-positive alpha, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input table does not follow the expected schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Selection cut outside its valid domain
    #[error("Invalid cut: {0}")]
    InvalidCut(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
