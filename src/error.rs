//! # Error Types
//!
//! This module defines error types used throughout the rotulo library.
//!
//! Content-level problems (unresolved tokens, invalid barcode payloads,
//! damaged editor trees) are not errors: they degrade visibly and are
//! handled where they occur. These variants cover the crate boundary only.

use thiserror::Error;

/// Main error type for rotulo operations
#[derive(Debug, Error)]
pub enum RotuloError {
    /// Configuration could not be loaded or is inconsistent
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed label document
    #[error("Label error: {0}")]
    Label(String),

    /// HTTP server error (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
