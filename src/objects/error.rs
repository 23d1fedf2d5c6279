use thiserror::Error;

/// Errors that can occur when interacting with the object store
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("Failed to connect to object store: {0}")]
    ConnectionError(String),

    #[error("Object {0} not found")]
    ObjectNotFound(String),

    #[error("Access denied for object {0}: {1}")]
    AccessDenied(String, String),

    #[error("Upload of {0} failed: {1}")]
    UploadError(String, String),

    #[error("Metadata update for {0} failed: {1}")]
    MetadataError(String, String),

    #[error("Failed to read object {0}: {1}")]
    ReadError(String, String),

    #[error("Failed to delete object {0}: {1}")]
    DeleteError(String, String),

    #[error("Not an object reference: {0}")]
    InvalidReference(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Other object store error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Errors from recovering an object path out of a download URL
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlPathError {
    #[error("URL has no encoded object segment: {0}")]
    MissingSegment(String),

    #[error("Encoded object segment is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}
