/// Database layer
///
/// Connection pooling and schema migrations for the PostgreSQL store. Queries
/// themselves live in [`crate::repo::postgres`].
///
/// # Example
///
/// ```no_run
/// use uptask_shared::db::pool::{create_pool, DatabaseConfig};
/// use uptask_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
