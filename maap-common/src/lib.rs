//! # MAAP Common Library
//!
//! Shared code for the MAAP snapshot tooling:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Database initialization and stored snapshot models
//! - Timestamp utilities

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
