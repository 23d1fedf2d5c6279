use crate::config::ObjectStoreConfig;
use crate::objects::error::ObjectStoreError;
use crate::objects::path::encode_object_path;
use crate::objects::storage::{ObjectStore, UploadProgress};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, MetadataDirective};
use aws_sdk_s3::{config::Region, Client};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// S3 rejects multipart parts smaller than this, except the last one
const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Real S3 implementation of the ObjectStore trait
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
    part_size: usize,
    cache: Arc<Mutex<lru::LruCache<String, Bytes>>>,
}

impl S3ObjectStore {
    /// Create a new S3ObjectStore instance from configuration
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        info!(
            "Creating S3ObjectStore with config: endpoint={:?}, region={}, bucket={}",
            config.endpoint, config.region, config.bucket
        );

        if config.public_base_url.trim().is_empty() {
            return Err(ObjectStoreError::ConfigurationError(
                "objects.public_base_url must be set".to_string(),
            ));
        }

        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        // Static credentials win over the environment chain
        let sdk_config = if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "StaticCredentialsProvider",
            );
            loader.credentials_provider(credentials).load().await
        } else {
            loader.load().await
        };

        // Path-style requests keep MinIO and other S3-compatible stores working
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(true);
        if let Some(endpoint) = &config.endpoint {
            info!("Setting custom endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        let cache_size = NonZeroUsize::new(config.cache_entries.max(1))
            .ok_or_else(|| ObjectStoreError::ConfigurationError("cache size".to_string()))?;

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            part_size: (config.part_size_mib * 1024 * 1024).max(MIN_PART_SIZE),
            cache: Arc::new(Mutex::new(lru::LruCache::new(cache_size))),
        })
    }

    async fn upload_multipart(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(), ObjectStoreError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::UploadError))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| {
                ObjectStoreError::UploadError(path.to_string(), "missing upload id".to_string())
            })?
            .to_string();

        let total_bytes = data.len() as u64;
        let mut parts = Vec::new();
        let mut offset = 0usize;
        let mut part_number = 1i32;

        while offset < data.len() {
            let end = (offset + self.part_size).min(data.len());
            let body = data.slice(offset..end);

            let uploaded = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(path)
                .upload_id(&upload_id)
                .part_number(part_number)
                .body(ByteStream::from(body))
                .send()
                .await;

            let uploaded = match uploaded {
                Ok(uploaded) => uploaded,
                Err(e) => {
                    self.abort_multipart(path, &upload_id).await;
                    return Err(classify(path, e, ObjectStoreError::UploadError));
                }
            };

            parts.push(
                CompletedPart::builder()
                    .e_tag(uploaded.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            offset = end;
            part_number += 1;
            progress(UploadProgress {
                bytes_transferred: offset as u64,
                total_bytes,
            });
        }

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await;

        if let Err(e) = completed {
            self.abort_multipart(path, &upload_id).await;
            return Err(classify(path, e, ObjectStoreError::UploadError));
        }

        Ok(())
    }

    async fn abort_multipart(&self, path: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(path)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!("Failed to abort multipart upload for {}: {}", path, e);
        }
    }
}

/// Map an SDK error onto the store's taxonomy, using `fallback` for anything
/// that is neither a missing object nor a permission problem
fn classify<E, R>(
    path: &str,
    err: SdkError<E, R>,
    fallback: fn(String, String) -> ObjectStoreError,
) -> ObjectStoreError
where
    E: ProvideErrorMetadata,
{
    if let Some(code) = err.code() {
        match code {
            "NoSuchKey" | "KeyNotFound" | "NotFound" => {
                return ObjectStoreError::ObjectNotFound(path.to_string());
            }
            "AccessDenied" => {
                return ObjectStoreError::AccessDenied(path.to_string(), err.to_string());
            }
            _ => {}
        }
    }

    if let SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) = err {
        return ObjectStoreError::ConnectionError(err.to_string());
    }

    // Fallback to string matching for other cases
    let error_str = err.to_string();
    if error_str.contains("NoSuchKey") || error_str.contains("404") {
        ObjectStoreError::ObjectNotFound(path.to_string())
    } else if error_str.contains("AccessDenied") {
        ObjectStoreError::AccessDenied(path.to_string(), error_str)
    } else {
        fallback(path.to_string(), error_str)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
        progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> Result<(), ObjectStoreError> {
        debug!("Uploading {} ({} bytes) to S3", path, data.len());

        if data.len() > self.part_size {
            return self.upload_multipart(path, data, content_type, progress).await;
        }

        let total_bytes = data.len() as u64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::UploadError))?;

        progress(UploadProgress {
            bytes_transferred: total_bytes,
            total_bytes,
        });
        Ok(())
    }

    async fn set_content_type(
        &self,
        path: &str,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        debug!("Setting content type of {} to {}", path, content_type);

        // S3 metadata is immutable; a self-copy with REPLACE rewrites it
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(path)
            .copy_source(format!("{}/{}", self.bucket, encode_object_path(path)))
            .content_type(content_type)
            .metadata_directive(MetadataDirective::Replace)
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::MetadataError))?;

        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, ObjectStoreError> {
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::ReadError))?;

        Ok(format!(
            "{}/o/{}?alt=media",
            self.public_base_url,
            encode_object_path(path)
        ))
    }

    async fn delete_object(&self, path: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::DeleteError))?;

        let mut cache = self.cache.lock().await;
        cache.pop(path);

        debug!("Successfully removed object: {}", path);
        Ok(())
    }

    async fn get_object(&self, path: &str) -> Result<Bytes, ObjectStoreError> {
        // Check cache first
        {
            let mut cache = self.cache.lock().await;
            if let Some(data) = cache.get(path) {
                debug!("Cache hit for object: {}", path);
                return Ok(data.clone());
            }
        }

        debug!("Fetching object from S3: {}", path);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| classify(path, e, ObjectStoreError::ReadError))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::ReadError(path.to_string(), e.to_string()))?
            .into_bytes();

        {
            let mut cache = self.cache.lock().await;
            cache.put(path.to_string(), data.clone());
        }

        Ok(data)
    }

    fn reference_from_url(&self, url: &str) -> Result<String, ObjectStoreError> {
        let native_prefix = format!("s3://{}/", self.bucket);
        if let Some(key) = url.strip_prefix(&native_prefix) {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        let download_prefix = format!("{}/o/", self.public_base_url);
        if let Some(rest) = url.strip_prefix(&download_prefix) {
            let encoded = rest.split('?').next().unwrap_or_default();
            if let Ok(key) = percent_decode_str(encoded).decode_utf8() {
                if !key.is_empty() {
                    return Ok(key.into_owned());
                }
            }
        }

        Err(ObjectStoreError::InvalidReference(url.to_string()))
    }
}
