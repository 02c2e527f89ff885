//! Error types for brandmem
//!
//! A single error hierarchy shared by the storage, vector, graph and memory crates.

use thiserror::Error;

/// The main error type for brandmem operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Storage Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    // ========== Serialization Errors ==========
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ========== Collaborator Errors ==========
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    // ========== Validation Errors ==========
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========== IO Errors ==========
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for brandmem operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::Enrichment(_) | Error::Io(_))
    }

    /// Returns true if the caller passed something the system refuses
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::InvalidNamespace(_) | Error::InvalidInput(_))
    }
}
