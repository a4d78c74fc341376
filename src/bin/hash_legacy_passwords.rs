//! One-off migration that replaces legacy plaintext passwords with Argon2 hashes.

use anyhow::Context;
use employee_profiles::{
    db::postgres::create_pool,
    repositories::sqlx_repo::SqlxEmployeeRepo,
    settings::AppConfig,
    use_cases::employees::EmployeeHandler,
    utils::uploads::PictureStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::new().context("failed to load configuration")?;
    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to the database")?;

    let pictures = PictureStore::new(&config.upload_dir, config.max_upload_bytes());
    let handler = EmployeeHandler::new(SqlxEmployeeRepo::new(pool), pictures);
    let migrated = handler
        .hash_legacy_passwords()
        .await
        .map_err(|e| anyhow::anyhow!("password migration failed: {}", e))?;

    tracing::info!("Password migration complete, {} account(s) updated", migrated);
    Ok(())
}
