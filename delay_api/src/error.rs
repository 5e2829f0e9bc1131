use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::FieldError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Rejected by the model's input checks; the message goes back verbatim.
    #[error("{0}")]
    BadInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<delay_model::Error> for ApiError {
    fn from(e: delay_model::Error) -> Self {
        if e.is_input_error() {
            ApiError::BadInput(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": errors }))).into_response()
            }
            ApiError::BadInput(message) => {
                tracing::info!("rejected input: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": message }))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!("predict failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
