//! Public handlers: health, index and cached playlist serving

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{responses::ApiResponse, AppState};
use crate::errors::{AppError, AppResult};
use crate::models::{PlaylistExtension, SystemStatus};

const PLAYLIST_FILE_STEM: &str = "iptv";

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSource {
    pub directory_name: String,
    pub path: String,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub status: SystemStatus,
    pub sources: Vec<PublicSource>,
}

/// Service status plus the public path of every source. Source URLs are
/// not exposed here.
pub async fn index(State(state): State<AppState>) -> AppResult<Json<ApiResponse<IndexResponse>>> {
    let status = state.service.status().await?;
    let sources = state
        .service
        .list_sources()
        .await?
        .into_iter()
        .map(|record| PublicSource {
            path: record.playlist_path(),
            directory_name: record.directory_name,
            last_updated: record.last_updated,
        })
        .collect();

    Ok(Json(ApiResponse::success(IndexResponse { status, sources })))
}

/// `GET /:directory/:file` where `file` is `iptv.<extension>`
pub async fn serve_playlist(
    Path((directory, file)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let extension = parse_playlist_file(&file)
        .ok_or_else(|| AppError::not_found("playlist", format!("{}/{}", directory, file)))?;

    let body = state.service.playlist(&directory, extension).await?;

    Ok((
        [
            (header::CONTENT_TYPE, extension.mime_type()),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
        .into_response())
}

fn parse_playlist_file(file: &str) -> Option<PlaylistExtension> {
    let (stem, extension) = file.split_once('.')?;
    if stem != PLAYLIST_FILE_STEM {
        return None;
    }
    extension.parse().ok()
}
