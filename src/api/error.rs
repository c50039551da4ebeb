use actix_session::{SessionGetError, SessionInsertError};
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::validation::ErrorResponse;

/// Request-terminating failures. Form validation problems are not errors:
/// they re-render the form instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing entity, wrong method or failed precondition
    #[error("{0}")]
    NotFound(String),

    /// Request body that could not be read at all
    #[error("{0}")]
    BadRequest(String),

    /// Missing or mismatched anti-forgery token
    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Session read error: {0}")]
    SessionRead(#[from] SessionGetError),

    #[error("Session write error: {0}")]
    SessionWrite(#[from] SessionInsertError),

    #[error("Upload error: {0}")]
    Upload(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(msg) => {
                warn!("Not found: {}", msg);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            AppError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Bad request".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            AppError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                HttpResponse::Forbidden().json(ErrorResponse {
                    error: "Forbidden".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            other => {
                // Details stay in the logs, the client gets a generic body
                error!("Request failed: {}", other);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Internal error occurred"}),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        assert_eq!(AppError::not_found("Job").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("Unreadable upload".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Forbidden("CSRF attack detected.".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
