use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use super::{object_key, object_key_from_url, BlobStore, StorageError};
use crate::config::StorageConfig;

/// Blob store backed by S3 or any S3-compatible endpoint (MinIO, R2).
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Base of the public object URLs this store hands out.
    url_base: String,
}

impl S3BlobStore {
    pub async fn from_config(cfg: &StorageConfig) -> Self {
        let region = aws_config::Region::new(cfg.region.clone());
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if !cfg.endpoint.is_empty() {
            // S3-compatible stores generally require path-style addressing
            builder = builder.endpoint_url(&cfg.endpoint).force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        let url_base = if cfg.endpoint.is_empty() {
            format!("https://{}.s3.{}.amazonaws.com", cfg.bucket, cfg.region)
        } else {
            format!("{}/{}", cfg.endpoint.trim_end_matches('/'), cfg.bucket)
        };

        Self {
            client,
            bucket: cfg.bucket.clone(),
            url_base,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(format!("{}/{}", self.url_base, key))
    }

    async fn get(&self, file_url: &str) -> Result<Vec<u8>, StorageError> {
        let key = object_key_from_url(file_url)?;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::NotFound(key.clone())
                } else {
                    StorageError::Download(service_err.to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Download(e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, file_url: &str) -> Result<(), StorageError> {
        let key = object_key_from_url(file_url)?;

        // S3 delete is idempotent: deleting an absent key succeeds
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        Ok(())
    }
}
