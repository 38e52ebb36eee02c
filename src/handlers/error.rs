use crate::error::not_found_page;
use axum::{http::Uri, response::Response};

/// Router fallback for paths no route matches.
pub async fn page_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    not_found_page(Some(uri.path()))
}
