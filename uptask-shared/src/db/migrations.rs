/// Schema migrations
///
/// The SQL files in `uptask-shared/migrations/` are compiled into the binary
/// and applied in filename order. Applied versions are recorded by sqlx, so
/// this runs at every startup.

use sqlx::{migrate::MigrateError, postgres::PgPool};

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Migration failed"))?;

    tracing::info!("Database schema is up to date");
    Ok(())
}
