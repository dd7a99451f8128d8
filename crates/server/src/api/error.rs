//! Error responses for API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pressroom_core::{ItemError, ServiceError};
use serde::Serialize;
use tracing::error;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ItemError>>,
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request.
    BadRequest(String),
    /// An uploaded part exceeds the per-file limit.
    PayloadTooLarge(String),
    /// Failure from the processing service.
    Service(ServiceError),
    /// Anything else that should never reach the client in detail.
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Service(err) => match err {
                ServiceError::Input(_) | ServiceError::AllFailed { .. } => StatusCode::BAD_REQUEST,
                ServiceError::CacheMiss
                | ServiceError::ItemNotFound { .. }
                | ServiceError::InvalidIndex { .. } => StatusCode::NOT_FOUND,
                ServiceError::Archive(_) | ServiceError::Storage(_) | ServiceError::Task(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) | Self::PayloadTooLarge(message) => ErrorResponse {
                error: message,
                errors: None,
            },
            Self::Internal(message) => {
                error!("Internal error: {}", message);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    errors: None,
                }
            }
            Self::Service(ServiceError::AllFailed { errors }) => ErrorResponse {
                error: "No file was processed successfully".to_string(),
                errors: Some(errors),
            },
            Self::Service(
                err @ (ServiceError::Archive(_) | ServiceError::Storage(_) | ServiceError::Task(_)),
            ) => {
                error!("Request failed: {}", err);
                ErrorResponse {
                    error: err.to_string(),
                    errors: None,
                }
            }
            Self::Service(err) => ErrorResponse {
                error: err.to_string(),
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
