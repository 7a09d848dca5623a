use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scylla::errors::ExecutionError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] ExecutionError),
    #[error("Malformed row: {0}")]
    RowDecode(String),
    #[error("Not found")]
    NotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::SERVICE_UNAVAILABLE, "Message store unavailable".to_string())
            }
            Self::RowDecode(e) => {
                tracing::error!(error = %e, "Failed to decode stored message");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("bad".into()).into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::RowDecode("msg_type".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(ExecutionError::EmptyPlan).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
