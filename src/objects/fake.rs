use crate::objects::error::ObjectStoreError;
use crate::objects::path::encode_object_path;
use crate::objects::storage::{ObjectStore, UploadProgress};
use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const FAKE_HOST: &str = "https://fake.storage/v0/b";

#[derive(Clone, Debug)]
struct FakeObject {
    data: Bytes,
    content_type: String,
}

/// `FakeObjectStore` is an in-memory implementation of the `ObjectStore` trait for testing purposes.
/// It allows simulating failures per object and per operation.
#[derive(Clone)]
pub struct FakeObjectStore {
    bucket: String,
    chunk_size: usize,
    objects: Arc<Mutex<HashMap<String, FakeObject>>>,
    fail_uploads: Arc<Mutex<HashSet<String>>>,
    fail_metadata: Arc<Mutex<HashSet<String>>>,
    fail_urls: Arc<Mutex<HashSet<String>>>,
    fail_deletes: Arc<Mutex<HashSet<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl FakeObjectStore {
    /// Create a new empty FakeObjectStore for `bucket`
    pub fn new(bucket: &str) -> Self {
        FakeObjectStore {
            bucket: bucket.to_string(),
            chunk_size: 1024 * 1024,
            objects: Arc::new(Mutex::new(HashMap::new())),
            fail_uploads: Arc::new(Mutex::new(HashSet::new())),
            fail_metadata: Arc::new(Mutex::new(HashSet::new())),
            fail_urls: Arc::new(Mutex::new(HashSet::new())),
            fail_deletes: Arc::new(Mutex::new(HashSet::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report progress every `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Native reference for a path, e.g. `gs://bucket/videos/a.mp4`
    pub fn native_reference(&self, path: &str) -> String {
        format!("gs://{}/{}", self.bucket, path)
    }

    pub async fn fake_add_object(&self, path: &str, data: Bytes, content_type: &str) {
        let mut objects = self.objects.lock().await;
        objects.insert(
            path.to_string(),
            FakeObject {
                data,
                content_type: content_type.to_string(),
            },
        );
    }

    /// Uploads whose path ends with `suffix` fail
    pub async fn fake_fail_upload(&self, suffix: &str) {
        self.fail_uploads.lock().await.insert(suffix.to_string());
    }

    /// Metadata updates on paths ending with `suffix` fail
    pub async fn fake_fail_metadata(&self, suffix: &str) {
        self.fail_metadata.lock().await.insert(suffix.to_string());
    }

    /// Download URL lookups for paths ending with `suffix` fail
    pub async fn fake_fail_url(&self, suffix: &str) {
        self.fail_urls.lock().await.insert(suffix.to_string());
    }

    /// Deletes of paths ending with `suffix` fail
    pub async fn fake_fail_delete(&self, suffix: &str) {
        self.fail_deletes.lock().await.insert(suffix.to_string());
    }

    pub async fn fake_content_type(&self, path: &str) -> Option<String> {
        let objects = self.objects.lock().await;
        objects.get(path).map(|object| object.content_type.clone())
    }

    pub async fn fake_contains(&self, path: &str) -> bool {
        self.objects.lock().await.contains_key(path)
    }

    pub async fn fake_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Paths for which a delete was attempted, in order
    pub async fn fake_delete_attempts(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    async fn should_fail(set: &Mutex<HashSet<String>>, path: &str) -> bool {
        set.lock().await.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(), ObjectStoreError> {
        debug!("[FAKE] Uploading {} ({} bytes)", path, data.len());

        let total_bytes = data.len() as u64;
        let mut sent = 0u64;
        for chunk in data.chunks(self.chunk_size) {
            if Self::should_fail(&self.fail_uploads, path).await && sent > 0 {
                return Err(ObjectStoreError::UploadError(
                    path.to_string(),
                    "simulated network failure".to_string(),
                ));
            }
            sent += chunk.len() as u64;
            progress(UploadProgress {
                bytes_transferred: sent,
                total_bytes,
            });
        }

        if Self::should_fail(&self.fail_uploads, path).await {
            return Err(ObjectStoreError::UploadError(
                path.to_string(),
                "simulated network failure".to_string(),
            ));
        }
        if total_bytes == 0 {
            progress(UploadProgress {
                bytes_transferred: 0,
                total_bytes,
            });
        }

        self.fake_add_object(path, data, content_type).await;
        Ok(())
    }

    async fn set_content_type(
        &self,
        path: &str,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        if Self::should_fail(&self.fail_metadata, path).await {
            return Err(ObjectStoreError::MetadataError(
                path.to_string(),
                "simulated permission denied".to_string(),
            ));
        }

        let mut objects = self.objects.lock().await;
        match objects.get_mut(path) {
            Some(object) => {
                object.content_type = content_type.to_string();
                Ok(())
            }
            None => Err(ObjectStoreError::ObjectNotFound(path.to_string())),
        }
    }

    async fn download_url(&self, path: &str) -> Result<String, ObjectStoreError> {
        if Self::should_fail(&self.fail_urls, path).await {
            return Err(ObjectStoreError::ReadError(
                path.to_string(),
                "simulated url failure".to_string(),
            ));
        }
        if !self.fake_contains(path).await {
            return Err(ObjectStoreError::ObjectNotFound(path.to_string()));
        }

        Ok(format!(
            "{}/{}/o/{}?alt=media&token=fake",
            FAKE_HOST,
            self.bucket,
            encode_object_path(path)
        ))
    }

    async fn delete_object(&self, path: &str) -> Result<(), ObjectStoreError> {
        self.deleted.lock().await.push(path.to_string());

        if Self::should_fail(&self.fail_deletes, path).await {
            return Err(ObjectStoreError::DeleteError(
                path.to_string(),
                "simulated delete failure".to_string(),
            ));
        }

        let mut objects = self.objects.lock().await;
        if objects.remove(path).is_some() {
            Ok(())
        } else {
            Err(ObjectStoreError::ObjectNotFound(path.to_string()))
        }
    }

    async fn get_object(&self, path: &str) -> Result<Bytes, ObjectStoreError> {
        let objects = self.objects.lock().await;
        objects
            .get(path)
            .map(|object| object.data.clone())
            .ok_or_else(|| ObjectStoreError::ObjectNotFound(path.to_string()))
    }

    fn reference_from_url(&self, url: &str) -> Result<String, ObjectStoreError> {
        let native_prefix = format!("gs://{}/", self.bucket);
        if let Some(path) = url.strip_prefix(&native_prefix) {
            if !path.is_empty() {
                return Ok(path.to_string());
            }
        }

        let download_prefix = format!("{}/{}/o/", FAKE_HOST, self.bucket);
        if let Some(rest) = url.strip_prefix(&download_prefix) {
            let encoded = rest.split('?').next().unwrap_or_default();
            if let Ok(path) = percent_decode_str(encoded).decode_utf8() {
                if !path.is_empty() {
                    return Ok(path.into_owned());
                }
            }
        }

        Err(ObjectStoreError::InvalidReference(url.to_string()))
    }
}

impl Default for FakeObjectStore {
    fn default() -> Self {
        Self::new("test-bucket")
    }
}
