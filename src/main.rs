use anyhow::Context;

use userstore::{config::AppConfig, store::PgUserStore, telemetry};

/// Connects to the database and brings the `users` schema up to date.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init()?;

    let config = AppConfig::from_env()?;
    if config.jwt.secret.is_none() {
        tracing::warn!("JWT_SECRET is not set; token issuance will fail");
    }

    let store = PgUserStore::connect(&config.database_url, config.max_connections).await?;
    store
        .migrate()
        .await
        .context("apply users schema migrations")?;

    tracing::info!(scheme = ?config.password.scheme, "users schema is up to date");
    Ok(())
}
