use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::FlatPageModel;
use crate::response::View;
use crate::services::flatpage::{page_url, FlatPageService};
use crate::utils::next_url::login_redirect_target;
use axum::{
    extract::Path,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

pub const FLATPAGE_TEMPLATE: &str = "flatpages/default.html";

#[derive(Debug, Serialize, ToSchema)]
pub struct FlatPageContext {
    pub flatpage: FlatPageModel,
}

#[utoipa::path(
    get,
    path = "/about/{url}",
    params(("url" = String, Path, description = "Page path below /about/, e.g. `license/`")),
    responses(
        (status = 200, description = "Static page", body = FlatPageContext),
        (status = 303, description = "Login required for this page"),
        (status = 404, description = "No page at this URL"),
    ),
    tag = "pages"
)]
pub async fn flatpage(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    uri: Uri,
    Path(url): Path<String>,
) -> AppResult<Response> {
    render(&db, viewer, uri.path(), &page_url(&url)).await
}

/// Pages mounted at their own top-level path (`/about-us/`, `/terms/`, ...).
#[utoipa::path(
    get,
    path = "/terms/",
    responses(
        (status = 200, description = "Static page", body = FlatPageContext),
        (status = 404, description = "Page not configured"),
    ),
    tag = "pages"
)]
pub async fn named_flatpage(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    uri: Uri,
) -> AppResult<Response> {
    render(&db, viewer, uri.path(), uri.path()).await
}

async fn render(
    db: &DatabaseConnection,
    viewer: Option<AuthUser>,
    request_path: &str,
    url: &str,
) -> AppResult<Response> {
    let pages = FlatPageService::new(db.clone());

    let Some(page) = pages.find_by_url(url).await? else {
        if !url.ends_with('/') && pages.find_by_url(&format!("{}/", url)).await?.is_some() {
            return Ok(Redirect::permanent(&format!("{}/", request_path)).into_response());
        }
        return Err(AppError::NotFound);
    };

    if page.registration_required && viewer.is_none() {
        return Ok(Redirect::to(&login_redirect_target(request_path)).into_response());
    }

    Ok(View::render(FLATPAGE_TEMPLATE, FlatPageContext { flatpage: page }).into_response())
}
