use crate::objects::error::ObjectStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Bytes transferred so far for one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Fraction in `[0, 1]`; an empty body counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.bytes_transferred as f64 / self.total_bytes as f64
        }
    }
}

/// ObjectStore trait defining the interface for the binary store backing video files
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Upload `data` to `path`, calling `progress` after each transferred chunk
    ///
    /// * `path` - Object path, e.g. `videos/1700000000000-0-clip.mp4`
    /// * `content_type` - Declared content type sent with the upload
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(), ObjectStoreError>;

    /// Replace the content-type metadata of an existing object
    async fn set_content_type(&self, path: &str, content_type: &str)
        -> Result<(), ObjectStoreError>;

    /// Durable URL the feed uses to play the object
    async fn download_url(&self, path: &str) -> Result<String, ObjectStoreError>;

    /// Delete an object
    async fn delete_object(&self, path: &str) -> Result<(), ObjectStoreError>;

    /// Retrieve the raw bytes of an object
    async fn get_object(&self, path: &str) -> Result<Bytes, ObjectStoreError>;

    /// Resolve an object path directly from a URL this store understands
    /// (its own download URLs or its native scheme)
    fn reference_from_url(&self, url: &str) -> Result<String, ObjectStoreError>;
}

/// Implementation of ObjectStore trait for Arc<T> where T implements ObjectStore
///
/// This allows sharing one store between the upload pipeline, the maintenance
/// sweep and the cards.
#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(), ObjectStoreError> {
        (**self).upload(path, data, content_type, progress).await
    }

    async fn set_content_type(
        &self,
        path: &str,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        (**self).set_content_type(path, content_type).await
    }

    async fn download_url(&self, path: &str) -> Result<String, ObjectStoreError> {
        (**self).download_url(path).await
    }

    async fn delete_object(&self, path: &str) -> Result<(), ObjectStoreError> {
        (**self).delete_object(path).await
    }

    async fn get_object(&self, path: &str) -> Result<Bytes, ObjectStoreError> {
        (**self).get_object(path).await
    }

    fn reference_from_url(&self, url: &str) -> Result<String, ObjectStoreError> {
        (**self).reference_from_url(url)
    }
}
