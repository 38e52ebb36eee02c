use crate::error::{not_found_page, server_error_page, NotFoundPage};
use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::any::Any;

/// Fills in the requested path on 404 pages produced anywhere below.
pub async fn error_page_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if response.status() == StatusCode::NOT_FOUND
        && response.extensions().get::<NotFoundPage>().is_some()
    {
        return not_found_page(Some(&path));
    }
    response
}

/// Response for a handler panic, used with tower-http's `CatchPanicLayer`.
pub fn panic_page(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);
    server_error_page()
}
