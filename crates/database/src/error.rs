use analytics::AnalyticsError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database query failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("'{0}' already exists.")]
    AlreadyExists(String),

    #[error("The record does not belong to the requesting user.")]
    Forbidden,

    #[error("Stored data is inconsistent: {0}")]
    InvalidData(String),

    #[error("Rejected update: {0}")]
    Validation(#[from] CoreError),
}

impl From<DbError> for AnalyticsError {
    fn from(err: DbError) -> Self {
        AnalyticsError::DataAccess(err.to_string())
    }
}
