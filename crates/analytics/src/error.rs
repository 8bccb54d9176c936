use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Data access failed during aggregation: {0}")]
    DataAccess(String),

    #[error("Requested user {0} does not exist")]
    UserNotFound(Uuid),
}
