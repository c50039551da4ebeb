use sqlx::{Pool, Postgres};
use tracing::info;

/// Run all pending database migrations
///
/// Embeds the SQL files from the migrations directory, including the
/// category seed. Safe to run repeatedly since sqlx records applied
/// migrations.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}
