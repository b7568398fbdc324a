//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use crate::error::AppError;

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    category: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) | AppError::UnsupportedUpload(_) | AppError::Query(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Config(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}: {}", self.0.category(), self.0);
        }

        let body = ErrorBody {
            error: ErrorDetails {
                category: self.0.category(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
