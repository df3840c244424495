//! Session cookie parsing and formatting

use chrono::Duration;

/// Value of cookie `name` in a `Cookie` header (`a=1; b=2`).
///
/// Names must match exactly; an empty value is treated as absent.
pub fn extract_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value issued on login
pub fn session_cookie(name: &str, session_id: &str, max_age: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Path=/admin; Max-Age={}; SameSite=Strict",
        name,
        session_id,
        max_age.num_seconds()
    )
}

/// `Set-Cookie` value that clears the session cookie
pub fn expired_session_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; Path=/admin; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Strict",
        name
    )
}
