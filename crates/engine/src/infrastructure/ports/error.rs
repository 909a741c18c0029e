//! Error types for port operations.

/// Durable store operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// A stored value could not be handed back as bytes.
    #[error("Stored value under {key} is unreadable: {message}")]
    Encoding { key: String, message: String },

    /// The store refuses all operations (quota exceeded, storage disabled).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    pub fn encoding(key: impl ToString, message: impl ToString) -> Self {
        Self::Encoding {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }
}

/// Variant catalog errors. Callers treat all of these as "keep what you had".
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Variant catalog request failed: {0}")]
    RequestFailed(String),
    #[error("Variant catalog unavailable")]
    Unavailable,
}

impl CatalogError {
    pub fn request_failed(message: impl ToString) -> Self {
        Self::RequestFailed(message.to_string())
    }
}
