use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub mod models;

/// Idempotent relational schema, applied by the `migrate` bin.
pub const SCHEMA_SQL: &str = include_str!("../../schema.sql");

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the connection pool from DATABASE_URL and the pool settings.
///
/// The pool is constructed lazily so the process can come up (and report a
/// degraded health status) before the database is reachable. The caller owns
/// the handle; there is no global pool.
pub fn connect(cfg: &crate::config::DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let mut options = match std::env::var("DATABASE_URL") {
        Ok(url) => PgConnectOptions::from_str(&url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?,
        // Fall back to libpq-style PG* environment defaults (localhost)
        Err(_) => PgConnectOptions::new(),
    };

    // TLS policy is explicit: required (with certificate verification) unless
    // configuration says otherwise. The URL's own sslmode is kept when TLS is
    // not required, so local setups keep working untouched.
    if cfg.require_tls {
        options = options.ssl_mode(PgSslMode::VerifyFull);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .connect_lazy_with(options);

    Ok(pool)
}

/// Pings the database to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the bundled schema script. Every statement is IF NOT EXISTS, so
/// re-running is safe.
pub async fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    use sqlx::Executor;
    pool.execute(SCHEMA_SQL).await?;
    Ok(())
}
