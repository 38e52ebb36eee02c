use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{PaginationQuery, View};
use crate::services::follow::FollowService;
use crate::services::media::MediaStorage;
use crate::services::post::{PostPage, PostService};
use crate::services::user::UserService;
use axum::{
    extract::{Path, Query},
    response::Redirect,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowContext {
    pub page_obj: PostPage,
}

fn profile_url(username: &str) -> String {
    format!("/{}/", username)
}

#[utoipa::path(
    get,
    path = "/follow/",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Posts by followed authors", body = FollowContext),
        (status = 303, description = "Redirect to login"),
    ),
    tag = "follows"
)]
pub async fn follow_index(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<View<FollowContext>> {
    let page_obj = PostService::new(db)
        .list_followed(auth_user.user_id, params.requested_page(), &media)
        .await?;
    Ok(View::render(FOLLOW_TEMPLATE, FollowContext { page_obj }))
}

#[utoipa::path(
    get,
    path = "/{username}/follow/",
    params(("username" = String, Path, description = "Author to follow")),
    responses(
        (status = 303, description = "Redirect to the author's profile"),
        (status = 404, description = "Unknown user"),
    ),
    tag = "follows"
)]
pub async fn profile_follow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let author = UserService::new(db.clone()).get_by_username(&username).await?;
    FollowService::new(db)
        .follow(auth_user.user_id, author.id)
        .await?;
    Ok(Redirect::to(&profile_url(&author.username)))
}

#[utoipa::path(
    get,
    path = "/{username}/unfollow/",
    params(("username" = String, Path, description = "Author to unfollow")),
    responses(
        (status = 303, description = "Redirect to the author's profile"),
        (status = 404, description = "Unknown user"),
    ),
    tag = "follows"
)]
pub async fn profile_unfollow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let author = UserService::new(db.clone()).get_by_username(&username).await?;
    FollowService::new(db)
        .unfollow(auth_user.user_id, author.id)
        .await?;
    Ok(Redirect::to(&profile_url(&author.username)))
}
