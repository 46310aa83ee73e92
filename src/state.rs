use sqlx::PgPool;
use std::sync::Arc;

use crate::services::ProjectService;
use crate::storage::BlobStore;

/// Shared application resources, constructed once in `main` and handed to
/// the router. Lifecycle is tied to process start/stop; nothing here is a
/// module-level singleton.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub storage: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(pool: PgPool, storage: Arc<dyn BlobStore>) -> Self {
        Self { pool, storage }
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.pool.clone(), self.storage.clone())
    }
}
