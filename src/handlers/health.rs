use axum::{response::IntoResponse, Extension, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    ),
    tag = "health"
)]
pub async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "quill",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}
