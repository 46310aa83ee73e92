use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded PDF drawing. `file_url` locates the blob in the object
/// store; the blob lives at least as long as this row. `level` is a
/// free-text floor/level label.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pdf {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub file_url: String,
    pub file_size: i64,
    pub level: String,
    pub created_at: DateTime<Utc>,
}
