use crate::services::qa::ServiceError;
use crate::services::staging::StagingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("QA service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Staging(e) => {
                tracing::error!("Staging error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save the uploaded file".to_string(),
                )
            }
            AppError::Service(e) => {
                tracing::error!("QA service error: {:?}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
