use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every way a request can fail. Rendered as `{"status": "error", "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized access")]
    Unauthorized,
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Limit already 0")]
    QuotaExhausted,
    #[error("API key expired")]
    Expired,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

pub const MISSING_FIELDS: &str = "Missing fields";
pub const INVALID_DATE: &str = "Invalid date format (dd-mm-yyyy)";
pub const INVALID_LIMIT: &str = "Invalid limitup (expected a non-negative integer)";
pub const MISSING_APIKEY: &str = "Missing apikey";
pub const INVALID_BODY: &str = "Invalid JSON body";
pub const KEY_EXISTS: &str = "API key already exists";
pub const NEW_KEY_EXISTS: &str = "New API key already exists";
pub const KEY_NOT_FOUND: &str = "API key not found";
pub const NO_UPDATE: &str = "No update found";

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::QuotaExhausted | ApiError::Expired => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({"status": "error", "message": message}))).into_response()
    }
}
