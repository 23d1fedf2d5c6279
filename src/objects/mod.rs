pub mod error;
#[cfg(test)]
pub mod fake;
pub mod path;
pub mod s3;
pub mod storage;

pub use error::{ObjectStoreError, UrlPathError};
#[cfg(test)]
pub use fake::FakeObjectStore;
pub use s3::S3ObjectStore;
pub use storage::{ObjectStore, UploadProgress};

use tracing::debug;

/// Resolve the object path behind a stored video URL.
///
/// The store's own parser is tried first; when it does not recognise the URL
/// the encoded `/o/` segment is decoded instead.
pub fn resolve_object_path<O: ObjectStore + ?Sized>(
    objects: &O,
    url: &str,
) -> Result<String, UrlPathError> {
    match objects.reference_from_url(url) {
        Ok(path) => Ok(path),
        Err(e) => {
            debug!("Direct reference failed for {}: {}; parsing URL", url, e);
            path::path_from_download_url(url)
        }
    }
}
