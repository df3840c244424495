//! Admin API handlers
//!
//! Everything except login and logout sits behind
//! [`require_session`](super::middleware::require_session).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::info;

use super::{
    middleware::{session_id_from, AdminUser},
    responses::{with_status, ApiResponse},
    AppState,
};
use crate::auth::{expired_session_cookie, session_cookie};
use crate::errors::{AppError, AppResult};
use crate::models::{
    IntervalUpdateRequest, LogEntry, LoginRequest, SourceCreateRequest, SourceRecord,
    SystemStatus,
};

/// Turn a JSON extractor rejection into a 400 with the usual envelope
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid_input("body", rejection.body_text()))
}

// Authentication

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let session_id = state
        .service
        .login(&request.username, &request.password, user_agent)
        .await?;
    let cookie = session_cookie(&state.cookie_name, &session_id, state.service.session_ttl());

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(json!({ "username": request.username }))),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(session_id) = session_id_from(&headers, &state.cookie_name) {
        state.service.logout(&session_id).await?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie(&state.cookie_name))],
        Json(ApiResponse::success(json!({ "loggedOut": true }))),
    )
        .into_response())
}

// Sources

pub async fn list_configs(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<SourceRecord>>>> {
    let sources = state.service.list_sources().await?;
    Ok(Json(ApiResponse::success(sources)))
}

pub async fn create_config(
    State(state): State<AppState>,
    Extension(AdminUser(username)): Extension<AdminUser>,
    payload: Result<Json<SourceCreateRequest>, JsonRejection>,
) -> AppResult<Response> {
    let request = json_body(payload)?;
    let record = state.service.add_source(request).await?;
    info!("Admin '{}' added source '{}'", username, record.directory_name);
    Ok(with_status(StatusCode::CREATED, record))
}

pub async fn delete_config(
    Path(directory): Path<String>,
    State(state): State<AppState>,
    Extension(AdminUser(username)): Extension<AdminUser>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.service.remove_source(&directory).await?;
    info!("Admin '{}' removed source '{}'", username, directory);
    Ok(Json(ApiResponse::success(json!({ "deleted": directory }))))
}

pub async fn config_content(
    Path(directory): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let content = state.service.cached_content(&directory).await?;
    Ok(Json(ApiResponse::success(json!({
        "directoryName": directory,
        "content": content,
    }))))
}

// Refreshing

pub async fn trigger_update(
    Path(directory): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    state.service.refresh_one(&directory).await?;
    Ok(with_status(
        StatusCode::ACCEPTED,
        json!({ "message": format!("Update started for {}", directory) }),
    ))
}

pub async fn run_batch(State(state): State<AppState>) -> Response {
    state.service.spawn_scheduled_batch();
    with_status(
        StatusCode::ACCEPTED,
        json!({ "message": "Scheduled refresh started" }),
    )
}

// Settings and diagnostics

pub async fn list_logs(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<LogEntry>>>> {
    let logs = state.service.recent_logs().await?;
    Ok(Json(ApiResponse::success(logs)))
}

pub async fn get_interval(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<IntervalUpdateRequest>>> {
    let hours = state.service.interval().await?;
    Ok(Json(ApiResponse::success(IntervalUpdateRequest { hours })))
}

pub async fn set_interval(
    State(state): State<AppState>,
    payload: Result<Json<IntervalUpdateRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<IntervalUpdateRequest>>> {
    let request = json_body(payload)?;
    state.service.set_interval(request.hours).await?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn get_status(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SystemStatus>>> {
    let status = state.service.status().await?;
    Ok(Json(ApiResponse::success(status)))
}
