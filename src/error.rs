use crate::response::View;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Payload too large")]
    PayloadTooLarge,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

/// Marker left on 404 responses so the error-page middleware can fill in the
/// requested path.
#[derive(Debug, Clone, Copy)]
pub struct NotFoundPage;

pub fn not_found_page(path: Option<&str>) -> Response {
    let mut response = View::render("misc/404.html", json!({ "path": path }))
        .with_status(StatusCode::NOT_FOUND)
        .into_response();
    response.extensions_mut().insert(NotFoundPage);
    response
}

pub fn server_error_page() -> Response {
    View::render("misc/500.html", json!({}))
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                return server_error_page();
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                return server_error_page();
            }
            AppError::NotFound => return not_found_page(None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_string())
            }
        };

        let body = json!({
            "error": error_message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_page_with_marker() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<NotFoundPage>().is_some());
    }

    #[test]
    fn database_error_is_a_server_error_page() {
        let response = AppError::Database(sea_orm::DbErr::Custom("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_keeps_message_status() {
        let response = AppError::Conflict("slug taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
