//! Crate error type for startup and configuration.
//!
//! The metrics core never fails; only wiring around it does.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatusError>;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
