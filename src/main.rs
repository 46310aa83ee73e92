use axum::{
    extract::{DefaultBodyLimit, State},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use smartcount_api::middleware::jwt_auth_middleware;
use smartcount_api::state::AppState;
use smartcount_api::{config, database, handlers, storage};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting SmartCount API in {:?} mode", config.environment);

    // The signing secret is process-wide and non-negotiable: refuse to serve
    // without it rather than issue unverifiable tokens later.
    if config.security.jwt_secret.is_empty() {
        tracing::error!("JWT_SECRET is not set; refusing to start");
        std::process::exit(1);
    }

    let pool = match database::connect(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("database configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let storage = storage::from_config(&config.storage).await;
    let state = AppState::new(pool, storage);

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("SMARTCOUNT_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("SmartCount API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    let config = config::config();

    // Everything project- and pdf-shaped sits behind the auth gate
    let protected = Router::new()
        .route(
            "/api/projects",
            get(handlers::projects::list).post(handlers::projects::create),
        )
        .route(
            "/api/projects/:id",
            put(handlers::projects::update).delete(handlers::projects::remove),
        )
        .route("/api/projects/:id/pdfs", post(handlers::projects::add_pdfs))
        .route("/api/pdfs/:id/data", get(handlers::pdfs::data))
        .route_layer(axum_middleware::from_fn(jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(protected)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    if config.api.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "SmartCount API",
        "version": version,
        "description": "Project-management backend for the SmartCount takeoff tool",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public)",
            "projects": "/api/projects[/:id] (bearer token required)",
            "pdfs": "/api/projects/:id/pdfs, /api/pdfs/:id/data (bearer token required)",
            "health": "/health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
