use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::ProjectWithPdfs;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::NewPdfFile;
use crate::state::AppState;

/// GET /api/projects - all of the caller's projects, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ProjectWithPdfs>>, ApiError> {
    let projects = state.projects().list_projects(user.user_id).await?;
    Ok(Json(projects))
}

/// POST /api/projects - multipart create: `name`, optional `data` (JSON
/// text), zero or more `pdfs` file parts
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectWithPdfs>), ApiError> {
    let mut name: Option<String> = None;
    let mut data: Option<Value> = None;
    let mut files: Vec<NewPdfFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("name") => {
                name = Some(read_text_field(field, "name").await?);
            }
            Some("data") => {
                let raw = read_text_field(field, "data").await?;
                data = Some(
                    serde_json::from_str(&raw)
                        .map_err(|_| ApiError::bad_request("data must be a JSON document"))?,
                );
            }
            Some("pdfs") | Some("pdfs[]") => {
                files.push(read_file_field(field).await?);
            }
            _ => {}
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required"))?;

    let project = state
        .projects()
        .create_project(user.user_id, name, data, files)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub data: Option<Value>,
}

/// PUT /api/projects/:id - rename and/or replace structured data
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectWithPdfs>, ApiError> {
    if body.name.is_none() && body.data.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }
    if matches!(&body.name, Some(n) if n.trim().is_empty()) {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let project = state
        .projects()
        .update_project(user.user_id, id, body.name, body.data)
        .await?;

    Ok(Json(project))
}

/// DELETE /api/projects/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.projects().delete_project(user.user_id, id).await?;
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

/// POST /api/projects/:id/pdfs - append drawings to an existing project
pub async fn add_pdfs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ProjectWithPdfs>, ApiError> {
    let mut files: Vec<NewPdfFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if matches!(field.name(), Some("pdfs") | Some("pdfs[]")) {
            files.push(read_file_field(field).await?);
        }
    }

    let project = state
        .projects()
        .add_pdfs(user.user_id, id, files)
        .await?;

    Ok(Json(project))
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read field '{}': {}", name, e)))
}

async fn read_file_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<NewPdfFile, ApiError> {
    let name = field
        .file_name()
        .map(|n| n.to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "drawing.pdf".to_string());

    let content_type = field
        .content_type()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "application/pdf".to_string());

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read uploaded file: {}", e)))?;

    Ok(NewPdfFile {
        name,
        content_type,
        bytes: bytes.to_vec(),
    })
}
