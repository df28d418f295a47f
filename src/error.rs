//! Error types for Barkeep
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BarkeepError
pub type Result<T> = std::result::Result<T, BarkeepError>;

/// Unified error type for Barkeep operations
#[derive(Debug, Error)]
pub enum BarkeepError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Store is closed")]
    Closed,

    #[error("Failed to close store: {0}")]
    Close(String),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Bucket / Key Errors
    // -------------------------------------------------------------------------
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Key {key} already in bucket {bucket}")]
    DuplicateKey { bucket: String, key: String },

    #[error("No value for {key} in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BarkeepError {
    /// Whether the caller can fix this by changing the request.
    ///
    /// Everything else is a server-side failure (storage, corruption,
    /// lifecycle).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BarkeepError::DuplicateKey { .. }
                | BarkeepError::NotFound { .. }
                | BarkeepError::Validation(_)
                | BarkeepError::Protocol(_)
        )
    }
}
