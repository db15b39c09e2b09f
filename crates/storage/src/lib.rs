//! Storage layer for the SRS backend.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod error;
pub mod graph_repository;
pub mod history_repository;
pub mod progress_repository;
pub mod session_repository;

pub use error::StorageError;
pub use graph_repository::GraphRepository;
pub use history_repository::HistoryRepository;
pub use progress_repository::ProgressRepository;
pub use session_repository::SessionRepository;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool, StorageError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(StorageError::Connection)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)
}

/// Check database connectivity.
pub async fn check_connection(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(StorageError::Query)?;
    Ok(())
}
