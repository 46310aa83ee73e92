use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{object_key, object_key_from_url, BlobStore, StorageError};

/// In-process blob store. Objects live for the lifetime of the process;
/// URLs use a `memory://` scheme but follow the same folder/key layout as
/// the S3 backend so URL→key recovery is identical.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

struct StoredObject {
    bytes: Vec<u8>,
    #[allow(dead_code)]
    content_type: String,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, for test assertions.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("blob map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(name);

        self.objects.lock().expect("blob map poisoned").insert(
            key.clone(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("memory://blobs/{}", key))
    }

    async fn get(&self, file_url: &str) -> Result<Vec<u8>, StorageError> {
        let key = object_key_from_url(file_url)?;

        self.objects
            .lock()
            .expect("blob map poisoned")
            .get(&key)
            .map(|o| o.bytes.clone())
            .ok_or(StorageError::NotFound(key))
    }

    async fn delete(&self, file_url: &str) -> Result<(), StorageError> {
        let key = object_key_from_url(file_url)?;

        // Idempotent, matching S3 semantics
        self.objects.lock().expect("blob map poisoned").remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryBlobStore::new();

        let url = store
            .put("plan.pdf", vec![1, 2, 3], "application/pdf")
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        assert_eq!(store.get(&url).await.unwrap(), vec![1, 2, 3]);

        store.delete(&url).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.get(&url).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_of_absent_object_succeeds() {
        let store = MemoryBlobStore::new();
        let url = store
            .put("plan.pdf", vec![0u8; 8], "application/pdf")
            .await
            .unwrap();

        store.delete(&url).await.unwrap();
        store.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn urls_recover_to_distinct_keys() {
        let store = MemoryBlobStore::new();
        let a = store.put("x.pdf", vec![1], "application/pdf").await.unwrap();
        let b = store.put("x.pdf", vec![2], "application/pdf").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.get(&a).await.unwrap(), vec![1]);
        assert_eq!(store.get(&b).await.unwrap(), vec![2]);
    }
}
