use crate::keys::{object_key, split_object_key, validate_object_name};
use crate::traits::{sort_most_recent_first, ObjectDescriptor, Storage, StorageError, StorageResult};
use crate::{Folder, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use lightbox_core::constants::DEFAULT_AWS_REGION;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// Credentials come from the standard AWS environment variables.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Public URL for an object key.
    ///
    /// S3-compatible endpoints use path style `{endpoint}/{bucket}/{key}`.
    /// AWS uses the virtual-hosted form, which drops the region for us-east-1.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else if self.region == DEFAULT_AWS_REGION {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    fn descriptor(meta: ObjectMeta) -> Option<ObjectDescriptor> {
        let key = meta.location.to_string();
        let (folder, name) = split_object_key(&key)?;
        Some(ObjectDescriptor {
            folder,
            name: name.to_string(),
            size: meta.size,
            last_modified: meta.last_modified,
            key,
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        folder: Folder,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_object_name(name)?;
        let key = object_key(folder, name);
        let size = data.len() as u64;
        let location = Path::from(key.as_str());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    async fn get(&self, folder: Folder, name: &str) -> StorageResult<Vec<u8>> {
        validate_object_name(name)?;
        let key = object_key(folder, name);
        let start = std::time::Instant::now();
        let location = Path::from(key.as_str());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.clone()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn list(&self, folder: Folder, max_keys: usize) -> StorageResult<Vec<ObjectDescriptor>> {
        let start = std::time::Instant::now();
        let prefix = Path::from(folder.as_str());

        // S3 returns keys in lexical order, so the whole folder is read before
        // ordering by modification time.
        let metas: Vec<ObjectMeta> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    folder = %folder,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 list failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let mut objects: Vec<ObjectDescriptor> =
            metas.into_iter().filter_map(Self::descriptor).collect();
        sort_most_recent_first(&mut objects);
        objects.truncate(max_keys);

        tracing::debug!(
            bucket = %self.bucket,
            folder = %folder,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(objects)
    }

    fn build_url(&self, folder: Folder, name: &str) -> String {
        self.generate_url(&object_key(folder, name))
    }

    async fn check_access(&self) -> StorageResult<()> {
        let prefix = Path::from(Folder::Uploads.as_str());
        self.store
            .list_with_delimiter(Some(&prefix))
            .await
            .map_err(|e| {
                let message = e.to_string();
                match e {
                    ObjectStoreError::NotFound { .. } => StorageError::ConfigError(format!(
                        "Bucket {} not found in region {}",
                        self.bucket, self.region
                    )),
                    ObjectStoreError::PermissionDenied { .. }
                    | ObjectStoreError::Unauthenticated { .. } => StorageError::ConfigError(
                        format!("Access denied to bucket {}: {}", self.bucket, message),
                    ),
                    _ => StorageError::BackendError(message),
                }
            })?;

        tracing::info!(
            bucket = %self.bucket,
            region = %self.region,
            "S3 bucket accessible"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
