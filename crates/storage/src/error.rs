//! Storage errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<StorageError> for srs_backend_domain::DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Query(e) => e.into(),
            StorageError::Connection(e) => e.into(),
            StorageError::Migration(e) => srs_backend_domain::DomainError::Database(e.to_string()),
        }
    }
}
