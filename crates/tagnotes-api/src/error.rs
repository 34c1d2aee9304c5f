use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::any::Any;
use tracing::error;

pub const ROUTE_NOT_FOUND: &str = "Endpoint not found";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

/// Every way a request can fail, mapped onto a status and a JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request body.
    Validation(String),
    NotFound(String),
    /// No route matches the path, including ids that are not integers.
    RouteNotFound,
    MethodNotAllowed,
    /// The store failed. The detail is logged, never sent to the client.
    Persistence(String),
}

impl From<tagnotes_core::Error> for ApiError {
    fn from(err: tagnotes_core::Error) -> Self {
        match err {
            tagnotes_core::Error::Validation(msg) => ApiError::Validation(msg),
            tagnotes_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Persistence(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, ROUTE_NOT_FOUND.to_string()),
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            ApiError::Persistence(detail) => {
                error!(error = %detail, "request failed in the store");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Response for a handler that panicked.
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR.to_string(),
        }),
    )
        .into_response()
}
