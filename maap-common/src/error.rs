//! Common error types for MAAP

use thiserror::Error;

/// Common result type for MAAP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across MAAP crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two keys of the same payload shape resolved to the same dimension
    /// and field but carried different values
    #[error(
        "Conflicting overlay values for {dimension}.{field} in {shape} shape: {first:?} vs {second:?}"
    )]
    OverlayConflict {
        dimension: String,
        field: String,
        shape: String,
        first: String,
        second: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
