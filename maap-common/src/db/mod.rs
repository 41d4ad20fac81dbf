//! Database initialization and stored snapshot models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;
