use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;

use crate::{error::ApiError, AppState};

/// Header carrying the shared admin secret.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Axum middleware that requires `X-Admin-Key: <admin_key>` on admin routes.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(k) if constant_time_eq(k.as_bytes(), state.admin_key.as_bytes()) => {
            next.run(request).await
        }
        _ => ApiError::Unauthorized.into_response(),
    }
}
