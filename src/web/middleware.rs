//! HTTP middleware

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::AppState;
use crate::auth::extract_cookie;
use crate::errors::AppError;

/// Username of the validated admin session, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AdminUser(pub String);

/// Session id carried by the request's `Cookie` headers, if any
pub fn session_id_from(request_headers: &axum::http::HeaderMap, cookie_name: &str) -> Option<String> {
    request_headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| extract_cookie(header, cookie_name))
        .map(str::to_string)
}

/// Reject requests without a valid admin session. A successful check also
/// slides the session's expiry.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id =
        session_id_from(request.headers(), &state.cookie_name).ok_or(AppError::InvalidSession)?;

    let username = state.service.validate_session(&session_id).await?;
    debug!("Admin request from '{}': {}", username, request.uri().path());

    request.extensions_mut().insert(AdminUser(username));
    Ok(next.run(request).await)
}
