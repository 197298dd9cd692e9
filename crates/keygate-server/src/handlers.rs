use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult, INVALID_BODY, KEY_NOT_FOUND},
    gate::UpdateDraft,
    registry::{present, KeyDraft, KeyEdit},
    AppState,
};

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Admin: keys ───────────────────────────────────────────────────────────────

pub async fn add_apikey(
    State(state): State<AppState>,
    payload: Result<Json<KeyDraft>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let draft = body(payload)?;
    state.registry.create(&draft)?;
    Ok(success("API key added"))
}

pub async fn edit_apikey(
    State(state): State<AppState>,
    payload: Result<Json<KeyEdit>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let edit = body(payload)?;
    state.registry.edit(&edit)?;
    Ok(success("API key updated"))
}

pub async fn list_apikey(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let apikeys = state.registry.list()?;
    Ok(Json(json!({"status": "success", "apikeys": apikeys})))
}

// ── Public: keys ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyRequest {
    pub apikey: Option<String>,
}

pub async fn check_apikey(
    State(state): State<AppState>,
    payload: Result<Json<KeyRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let req = body(payload)?;
    let key = present(&req.apikey).ok_or(ApiError::NotFound(KEY_NOT_FOUND))?;
    let inspection = state.registry.inspect(key)?;
    let record = inspection.record;
    Ok(Json(json!({
        "apikey": record.key,
        "expired": record.expiry,
        "limitup": record.quota,
        "message": inspection.status.label(),
    })))
}

pub async fn update_limit(
    State(state): State<AppState>,
    payload: Result<Json<KeyRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let req = body(payload)?;
    let key = present(&req.apikey).ok_or(ApiError::NotFound(KEY_NOT_FOUND))?;
    let left = state.registry.consume(key)?;
    Ok(Json(json!({
        "status": "success",
        "message": "Limit reduced by 1",
        "limitup": left,
    })))
}

// ── Update gate ───────────────────────────────────────────────────────────────

pub async fn add_update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateDraft>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let draft = body(payload)?;
    state.gate.set(&draft)?;
    Ok(success("Update saved"))
}

pub async fn check_update(
    State(state): State<AppState>,
    payload: Result<Json<KeyRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let req = body(payload)?;
    let update = state.gate.get(req.apikey.as_deref())?;
    Ok(Json(json!({"status": "success", "update": update})))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            Err(ApiError::Validation(INVALID_BODY))
        }
    }
}

fn success(message: &str) -> Json<Value> {
    Json(json!({"status": "success", "message": message}))
}
