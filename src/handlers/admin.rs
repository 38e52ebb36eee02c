use crate::error::{AppError, AppResult};
use crate::models::{FlatPageModel, GroupModel, UserModel};
use crate::response::{PaginatedResponse, PaginationQuery};
use crate::services::admin::{
    AdminCommentRow, AdminFollowRow, AdminGroupRow, AdminPostRow, AdminService, AdminUserRow,
    PubDateFilter,
};
use crate::services::flatpage::{FlatPageInput, FlatPageService};
use crate::services::group::{GroupInput, GroupService};
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminPostQuery {
    /// Substring searched in post text
    pub q: Option<String>,
    /// One of: today, past_7_days, this_month, this_year
    pub pub_date: Option<String>,
    /// Page number
    pub page: Option<String>,
}

impl AdminPostQuery {
    fn requested_page(&self) -> u64 {
        PaginationQuery {
            page: self.page.clone(),
        }
        .requested_page()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 20))]
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: String,
}

impl From<UserModel> for AdminUserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at.to_string(),
        }
    }
}

fn deleted(what: &str) -> impl IntoResponse {
    Json(json!({ "message": format!("{} deleted", what) }))
}

#[utoipa::path(
    get,
    path = "/admin/posts/",
    security(("jwt_token" = [])),
    params(AdminPostQuery),
    responses(
        (status = 200, description = "Posts, searchable by text and filterable by date", body = PaginatedResponse<AdminPostRow>),
        (status = 400, description = "Unknown pub_date filter", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<AdminPostQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = params
        .pub_date
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::parse::<PubDateFilter>)
        .transpose()?;

    let page = AdminService::new(db)
        .list_posts(params.q.as_deref(), filter, params.requested_page())
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    delete,
    path = "/admin/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post and its comments deleted"),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Post not found"),
    ),
    tag = "admin"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    AdminService::new(db).delete_post(id).await?;
    Ok(deleted("Post"))
}

#[utoipa::path(
    get,
    path = "/admin/groups/",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All groups", body = Vec<AdminGroupRow>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_groups(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(AdminService::new(db).list_groups().await?))
}

#[utoipa::path(
    post,
    path = "/admin/groups/",
    security(("jwt_token" = [])),
    request_body = GroupInput,
    responses(
        (status = 201, description = "Group created", body = GroupModel),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Slug already taken", body = AppError),
    ),
    tag = "admin"
)]
pub async fn create_group(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<GroupInput>,
) -> AppResult<impl IntoResponse> {
    let group = GroupService::new(db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    put,
    path = "/admin/groups/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Current group slug")),
    request_body = GroupInput,
    responses(
        (status = 200, description = "Group updated", body = GroupModel),
        (status = 404, description = "Group not found"),
        (status = 409, description = "Slug already taken", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_group(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
    Json(payload): Json<GroupInput>,
) -> AppResult<impl IntoResponse> {
    let group = GroupService::new(db).update(&slug, payload).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Group slug")),
    responses(
        (status = 200, description = "Group deleted, its posts keep existing without a group"),
        (status = 404, description = "Group not found"),
    ),
    tag = "admin"
)]
pub async fn delete_group(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    GroupService::new(db).delete(&slug).await?;
    Ok(deleted("Group"))
}

#[utoipa::path(
    get,
    path = "/admin/flatpages/",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All flat pages, by URL", body = Vec<FlatPageModel>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_flatpages(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(FlatPageService::new(db).list().await?))
}

#[utoipa::path(
    post,
    path = "/admin/flatpages/",
    security(("jwt_token" = [])),
    request_body = FlatPageInput,
    responses(
        (status = 201, description = "Flat page created", body = FlatPageModel),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "URL already used", body = AppError),
    ),
    tag = "admin"
)]
pub async fn create_flatpage(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<FlatPageInput>,
) -> AppResult<impl IntoResponse> {
    let page = FlatPageService::new(db).create(payload).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

#[utoipa::path(
    put,
    path = "/admin/flatpages/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Flat page ID")),
    request_body = FlatPageInput,
    responses(
        (status = 200, description = "Flat page updated", body = FlatPageModel),
        (status = 404, description = "Flat page not found"),
        (status = 409, description = "URL already used", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_flatpage(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<FlatPageInput>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(FlatPageService::new(db).update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/flatpages/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Flat page ID")),
    responses(
        (status = 200, description = "Flat page deleted"),
        (status = 404, description = "Flat page not found"),
    ),
    tag = "admin"
)]
pub async fn delete_flatpage(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    FlatPageService::new(db).delete(id).await?;
    Ok(deleted("Flat page"))
}

#[utoipa::path(
    get,
    path = "/admin/comments/",
    security(("jwt_token" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Comments, newest first", body = PaginatedResponse<AdminCommentRow>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = AdminService::new(db)
        .list_comments(params.requested_page())
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    delete,
    path = "/admin/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 404, description = "Comment not found"),
    ),
    tag = "admin"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    AdminService::new(db).delete_comment(id).await?;
    Ok(deleted("Comment"))
}

#[utoipa::path(
    get,
    path = "/admin/follows/",
    security(("jwt_token" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Follow relations", body = PaginatedResponse<AdminFollowRow>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_follows(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = AdminService::new(db)
        .list_follows(params.requested_page())
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    delete,
    path = "/admin/follows/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Follow ID")),
    responses(
        (status = 200, description = "Follow deleted"),
        (status = 404, description = "Follow not found"),
    ),
    tag = "admin"
)]
pub async fn delete_follow(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    AdminService::new(db).delete_follow(id).await?;
    Ok(deleted("Follow"))
}

#[utoipa::path(
    get,
    path = "/admin/users/",
    security(("jwt_token" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users by username", body = PaginatedResponse<AdminUserRow>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = AdminService::new(db)
        .list_users(params.requested_page())
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "User role updated", body = AdminUserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = AdminService::new(db)
        .update_user_role(id, &payload.role)
        .await?;
    Ok(Json(AdminUserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted with their posts, comments and follows"),
        (status = 404, description = "User not found"),
    ),
    tag = "admin"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    AdminService::new(db).delete_user(id).await?;
    Ok(deleted("User"))
}
