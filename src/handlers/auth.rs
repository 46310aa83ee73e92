use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{encode_token, password, Claims};
use crate::config;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// POST /api/auth/register - create an account and issue a session token
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if body.password.is_empty() {
        return Err(ApiError::bad_request("A password is required"));
    }

    let cfg = config::config();

    // Check first for a friendly error; the unique constraint still backs
    // this up against concurrent registrations
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = password::hash_password(&body.password, cfg.security.bcrypt_cost)?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
         RETURNING id, email, password_hash, created_at",
    )
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::bad_request("User already exists")
        }
        _ => ApiError::from(e),
    })?;

    let token = issue_token(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

/// POST /api/auth/login - verify credentials and issue a session token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user: Option<User> =
        sqlx::query_as("SELECT id, email, password_hash, created_at FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&state.pool)
            .await?;

    // Unknown email and wrong password are indistinguishable to the caller
    let user = match user {
        Some(u) => u,
        None => return Err(ApiError::unauthorized("Invalid credentials")),
    };

    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = issue_token(user.id, &user.email)?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
        },
    }))
}

fn issue_token(user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let cfg = config::config();
    let claims = Claims::new(user_id, email.to_string(), cfg.security.jwt_expiry_hours);

    encode_token(&claims, &cfg.security.jwt_secret).map_err(|e| {
        tracing::error!("token generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue session token")
    })
}
