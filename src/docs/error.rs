use thiserror::Error;

/// Errors that can occur when interacting with the document store
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Failed to open document store: {0}")]
    OpenError(String),

    #[error("Document store operation failed: {0}")]
    OperationError(String),

    #[error("Document {0} not found")]
    DocumentNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to decode document {0}: {1}")]
    DecodeError(String, String),

    #[error("Document store is locked")]
    Locked,

    #[error("Other document store error: {0}")]
    Other(#[from] anyhow::Error),
}
