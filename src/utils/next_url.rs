//! Helpers for the `?next=` return target used by the login redirect.

pub const LOGIN_URL: &str = "/auth/login/";

/// Percent-encode a local path for use as a query value. Slashes stay
/// readable so the result looks like `/auth/login/?next=/new/`.
fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).replace("%2F", "/")
}

pub fn login_redirect_target(path_and_query: &str) -> String {
    format!("{}?next={}", LOGIN_URL, encode_query_value(path_and_query))
}

/// Only same-site absolute paths are honoured as a post-login target.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next.to_string()
        }
        _ => "/".to_string(),
    }
}
