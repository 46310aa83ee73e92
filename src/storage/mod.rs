//! Blob storage for uploaded PDF drawings.
//!
//! Storage-agnostic: the workflow engine only sees the [`BlobStore`] trait.
//! Backends: S3 (or any S3-compatible endpoint) for deployments, and an
//! in-process memory store for tests and credential-less development.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object url: {0}")]
    InvalidUrl(String),
}

/// Remote blob store with put/get/delete over opaque object URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a blob, returning the URL that locates it from now on.
    async fn put(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Fetch a blob's bytes by the URL `put` returned.
    async fn get(&self, file_url: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove a blob. Deleting an already-absent object is not an error.
    async fn delete(&self, file_url: &str) -> Result<(), StorageError>;
}

/// Construct the backend selected by configuration.
pub async fn from_config(cfg: &crate::config::StorageConfig) -> Arc<dyn BlobStore> {
    match cfg.backend.as_str() {
        "memory" => {
            tracing::info!("using in-memory blob store");
            Arc::new(MemoryBlobStore::new())
        }
        _ => {
            tracing::info!(bucket = %cfg.bucket, "using S3 blob store");
            Arc::new(S3BlobStore::from_config(cfg).await)
        }
    }
}

/// Object key for a new upload: a generated unique prefix plus the
/// sanitized original filename, under a fixed folder.
fn object_key(name: &str) -> String {
    format!("pdfs/{}-{}", Uuid::new_v4(), sanitize_file_name(name))
}

/// Recover the object key from a stored URL: the last two path segments
/// (folder plus object name).
fn object_key_from_url(file_url: &str) -> Result<String, StorageError> {
    let parsed = url::Url::parse(file_url)
        .map_err(|_| StorageError::InvalidUrl(file_url.to_string()))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(StorageError::InvalidUrl(file_url.to_string()));
    }

    Ok(segments[segments.len() - 2..].join("/"))
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "drawing.pdf".to_string()
    } else {
        cleaned
    }
}
