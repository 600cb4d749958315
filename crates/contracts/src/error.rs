//! Layered error definitions
//!
//! Categorized by source: config / decode / serial / lock / storage / worker

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Serial Errors =====
    /// Serial device failure (disconnect, I/O error). Fatal.
    #[error("serial communication error on '{source_name}': {message}")]
    SerialCommunication {
        source_name: String,
        message: String,
    },

    // ===== Shared File Errors =====
    /// Advisory lock held by the other side; retry on the next tick
    #[error("advisory lock on '{path}' is held by another process")]
    LockUnavailable { path: String },

    /// Published file content could not be decoded (partial or stale write)
    #[error("published state decode error: {message}")]
    PublishedDecode { message: String },

    // ===== Storage Errors =====
    /// Position store failure. Fatal.
    #[error("storage operation '{operation}' failed: {message}")]
    StorageOperation { operation: String, message: String },

    // ===== Worker Errors =====
    /// A worker panicked inside its step
    #[error("worker '{worker}' panicked: {message}")]
    WorkerPanicked { worker: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create serial communication error
    pub fn serial(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SerialCommunication {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create storage operation error
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error must bring the whole process down
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::LockUnavailable { .. } | Self::PublishedDecode { .. }
        )
    }
}

/// Per-sentence decode failure. Never escapes the reading loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Header not in the template registry (or line too short to carry one)
    #[error("unrecognized sentence")]
    Unrecognized,

    /// Checksum missing or not matching the payload
    #[error("bad checksum on {header}")]
    Checksum { header: String },

    /// Field count differs from the registered template
    #[error("template mismatch on {header}: expected {expected} fields, got {actual}")]
    TemplateMismatch {
        header: String,
        expected: usize,
        actual: usize,
    },
}
