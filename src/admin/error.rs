use crate::docs::DocumentStoreError;
use thiserror::Error;

/// Validation errors that stop an upload batch before anything is attempted
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("Only admins can upload videos")]
    NotAuthorized,

    #[error("Choose at least one video to upload.")]
    NoFiles,
}

#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Only admins can run maintenance")]
    NotAuthorized,

    #[error("Fix error: {0}")]
    List(#[from] DocumentStoreError),
}
