//! Error types for CP
//!
//! Provides a unified error type for all protocol roles.

use thiserror::Error;

/// Result type alias using CpError
pub type Result<T> = std::result::Result<T, CpError>;

/// Unified error type for CP operations
#[derive(Debug, Error)]
pub enum CpError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    /// Malformed or checksum-invalid frame
    #[error("Illegal message: {0}")]
    IllegalMessage(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    /// Cookie acquisition exhausted its attempts or was rejected by the server
    #[error("Cookie request failed: {0}")]
    CookieRequest(String),

    /// Command round-trip exhausted its attempts or the server rejected the command
    #[error("Command timed out or was rejected: {0}")]
    CookieTimeout(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CpError {
    /// Shorthand used throughout the codec
    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        CpError::IllegalMessage(reason.into())
    }
}
