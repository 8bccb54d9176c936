use analytics::AnalyticsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Missing or unknown identity")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            AppError::Database(DbError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "Not allowed to modify this resource".to_string(),
            ),
            AppError::Database(DbError::AlreadyExists(name)) => {
                (StatusCode::CONFLICT, format!("'{name}' already exists"))
            }
            AppError::Database(DbError::Validation(core_err)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, core_err.to_string())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Analytics(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Analytics error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred during aggregation".to_string(),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
