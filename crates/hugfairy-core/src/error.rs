//! Error types for hugfairy-core.

use thiserror::Error;

/// Result type alias using hugfairy-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for hugfairy operations
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Structured XRPC error bodies ({ "error": ..., "message": ... })
    #[error("XRPC error {status} ({error}): {message}")]
    Xrpc {
        status: u16,
        error: String,
        message: String,
    },

    // Auth errors
    #[error("Session rejected: {0}")]
    SessionRejected(String),

    // Template errors
    #[error("Template file is empty")]
    NoTemplates,

    #[error("Template {index} is malformed: {reason}")]
    MalformedTemplate { index: usize, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an XRPC error from a status code and a decoded error body
    pub fn xrpc(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Xrpc {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// True for the token-expiry errors the PDS returns on a stale access JWT
    pub fn is_expired_token(&self) -> bool {
        matches!(self, Error::Xrpc { error, .. } if error == "ExpiredToken")
    }
}
