use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::db::store::StoreError;
use crate::utils::api_response::ApiResponse;

/// Failure taxonomy shared by every handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal failures are logged and answered with a generic message; the
    /// cause is only attached when `expose_detail` is set.
    pub fn into_api(self, expose_detail: bool) -> ApiResponse<()> {
        let status = self.status();
        match self {
            AppError::Store(err) => {
                error!(error = %err, "store operation failed");
                let detail = expose_detail.then(|| json!({ "error": err.to_string() }));
                ApiResponse::failure(status, "Server error", detail)
            }
            other => ApiResponse::failure(status, other.to_string(), None),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Malformed JSON body: {}", rejection.body_text()))
    }
}

/// Used where no state is at hand (extractor rejections); never exposes detail.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_api(false).into_response()
    }
}
