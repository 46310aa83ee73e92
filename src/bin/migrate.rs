//! Apply the bundled relational schema. Safe to re-run: every statement in
//! the script is IF NOT EXISTS.

use anyhow::Context;

use smartcount_api::{config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    let pool = database::connect(&config.database).context("failed to configure database pool")?;

    database::apply_schema(&pool)
        .await
        .context("schema migration failed")?;

    tracing::info!("database migration completed successfully");
    Ok(())
}
