use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{default_project_data, Pdf, Project, ProjectWithPdfs};
use crate::storage::{BlobStore, StorageError};

const PROJECT_COLUMNS: &str = "id, user_id, name, data, created_at, updated_at";
const PDF_COLUMNS: &str = "id, project_id, name, file_url, file_size, level, created_at";

/// An uploaded file payload on its way into a project.
#[derive(Debug)]
pub struct NewPdfFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Covers both "no such project" and "not owned by the caller" so
    /// existence is never leaked to non-owners.
    #[error("project not found")]
    NotFound,

    #[error("pdf not found")]
    PdfNotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orchestrates project lifecycle operations across the relational store
/// and the blob store. Relational writes are atomic; blob-store effects are
/// best-effort consistent (see individual operations).
pub struct ProjectService {
    pool: PgPool,
    store: Arc<dyn BlobStore>,
}

impl ProjectService {
    pub fn new(pool: PgPool, store: Arc<dyn BlobStore>) -> Self {
        Self { pool, store }
    }

    /// All projects owned by the user, newest first, each with its pdfs.
    pub async fn list_projects(&self, owner: Uuid) -> Result<Vec<ProjectWithPdfs>, ProjectError> {
        let projects: Vec<Project> = sqlx::query_as(&format!(
            "SELECT {} FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        if projects.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let pdfs: Vec<Pdf> = sqlx::query_as(&format!(
            "SELECT {} FROM pdfs WHERE project_id = ANY($1) ORDER BY created_at",
            PDF_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_project: HashMap<Uuid, Vec<Pdf>> = HashMap::new();
        for pdf in pdfs {
            by_project.entry(pdf.project_id).or_default().push(pdf);
        }

        Ok(projects
            .into_iter()
            .map(|project| {
                let pdfs = by_project.remove(&project.id).unwrap_or_default();
                ProjectWithPdfs { project, pdfs }
            })
            .collect())
    }

    /// Create a project with its initial files as one logical operation.
    ///
    /// The project row and every pdf row are inserted inside a single
    /// transaction; uploads happen between the inserts because the blob
    /// store cannot join the transaction. If anything fails the transaction
    /// rolls back and no rows remain, but blobs uploaded before the failure
    /// are left behind as orphans (accepted; there is no reconciliation
    /// sweep).
    pub async fn create_project(
        &self,
        owner: Uuid,
        name: String,
        data: Option<Value>,
        files: Vec<NewPdfFile>,
    ) -> Result<ProjectWithPdfs, ProjectError> {
        let data = data.unwrap_or_else(default_project_data);

        let mut tx = self.pool.begin().await?;

        let project: Project = sqlx::query_as(&format!(
            "INSERT INTO projects (user_id, name, data) VALUES ($1, $2, $3) RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(owner)
        .bind(&name)
        .bind(&data)
        .fetch_one(&mut *tx)
        .await?;

        // Uploads are sequential: one in flight at a time
        let mut pdfs = Vec::with_capacity(files.len());
        for file in files {
            let file_size = file.bytes.len() as i64;
            let file_url = self
                .store
                .put(&file.name, file.bytes, &file.content_type)
                .await?;

            let pdf: Pdf = sqlx::query_as(&format!(
                "INSERT INTO pdfs (project_id, name, file_url, file_size) \
                 VALUES ($1, $2, $3, $4) RETURNING {}",
                PDF_COLUMNS
            ))
            .bind(project.id)
            .bind(&file.name)
            .bind(&file_url)
            .bind(file_size)
            .fetch_one(&mut *tx)
            .await?;

            pdfs.push(pdf);
        }

        tx.commit().await?;

        Ok(ProjectWithPdfs { project, pdfs })
    }

    /// Rename and/or replace the structured data. A single conditional
    /// update filtered by both id and owner: zero rows means not-found OR
    /// not-owned, reported identically.
    pub async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        name: Option<String>,
        data: Option<Value>,
    ) -> Result<ProjectWithPdfs, ProjectError> {
        let project: Option<Project> = sqlx::query_as(&format!(
            "UPDATE projects SET name = COALESCE($1, name), data = COALESCE($2, data), \
             updated_at = now() WHERE id = $3 AND user_id = $4 RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(name)
        .bind(data)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let project = project.ok_or(ProjectError::NotFound)?;
        let pdfs = self.pdfs_for(project.id).await?;

        Ok(ProjectWithPdfs { project, pdfs })
    }

    /// Remove a project, its pdf rows and (best-effort) their blobs.
    ///
    /// Blob deletion happens strictly after commit so a failed delete call
    /// can never roll back an otherwise-successful removal of the metadata.
    /// A failed blob deletion is logged and swallowed; the leftover blob is
    /// an accepted leak.
    pub async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<(), ProjectError> {
        let mut tx = self.pool.begin().await?;

        // Recover the blob locators before the cascade removes the rows
        let file_urls: Vec<(String,)> =
            sqlx::query_as("SELECT file_url FROM pdfs WHERE project_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(ProjectError::NotFound);
        }

        tx.commit().await?;

        for (file_url,) in file_urls {
            if let Err(e) = self.store.delete(&file_url).await {
                tracing::warn!(
                    file_url = %file_url,
                    "blob cleanup after project delete failed: {}", e
                );
            }
        }

        Ok(())
    }

    /// Append files to an existing project. Ownership is verified first;
    /// each pdf insert then commits independently, so a failure partway
    /// leaves the earlier files attached.
    pub async fn add_pdfs(
        &self,
        owner: Uuid,
        id: Uuid,
        files: Vec<NewPdfFile>,
    ) -> Result<ProjectWithPdfs, ProjectError> {
        let project: Option<Project> = sqlx::query_as(&format!(
            "SELECT {} FROM projects WHERE id = $1 AND user_id = $2",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let project = project.ok_or(ProjectError::NotFound)?;

        for file in files {
            let file_size = file.bytes.len() as i64;
            let file_url = self
                .store
                .put(&file.name, file.bytes, &file.content_type)
                .await?;

            sqlx::query("INSERT INTO pdfs (project_id, name, file_url, file_size) VALUES ($1, $2, $3, $4)")
                .bind(project.id)
                .bind(&file.name)
                .bind(&file_url)
                .bind(file_size)
                .execute(&self.pool)
                .await?;
        }

        let pdfs = self.pdfs_for(project.id).await?;
        Ok(ProjectWithPdfs { project, pdfs })
    }

    /// Fetch a pdf's bytes, enforcing ownership through the project join.
    pub async fn pdf_data(&self, owner: Uuid, pdf_id: Uuid) -> Result<(Pdf, Vec<u8>), ProjectError> {
        let pdf: Option<Pdf> = sqlx::query_as(
            "SELECT p.id, p.project_id, p.name, p.file_url, p.file_size, p.level, p.created_at \
             FROM pdfs p JOIN projects pr ON pr.id = p.project_id \
             WHERE p.id = $1 AND pr.user_id = $2",
        )
        .bind(pdf_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let pdf = pdf.ok_or(ProjectError::PdfNotFound)?;
        let bytes = self.store.get(&pdf.file_url).await?;

        Ok((pdf, bytes))
    }

    async fn pdfs_for(&self, project_id: Uuid) -> Result<Vec<Pdf>, ProjectError> {
        let pdfs: Vec<Pdf> = sqlx::query_as(&format!(
            "SELECT {} FROM pdfs WHERE project_id = $1 ORDER BY created_at",
            PDF_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pdfs)
    }
}
