use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{PaginationQuery, View};
use crate::services::follow::FollowService;
use crate::services::media::MediaStorage;
use crate::services::post::{PostPage, PostService};
use crate::services::user::{ProfileSummary, UserService};
use axum::{
    extract::{Path, Query},
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

pub const PROFILE_TEMPLATE: &str = "posts/profile.html";

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileContext {
    pub author: ProfileSummary,
    pub page_obj: PostPage,
    /// Only present for a logged-in viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/{username}/",
    params(
        ("username" = String, Path, description = "Username"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Profile with the user's posts", body = ProfileContext),
        (status = 404, description = "Unknown user"),
    ),
    tag = "profiles"
)]
pub async fn profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    viewer: Option<AuthUser>,
    Path(username): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<View<ProfileContext>> {
    let users = UserService::new(db.clone());
    let user = users.get_by_username(&username).await?;
    let author = users.profile_summary(&user).await?;

    let page_obj = PostService::new(db.clone())
        .list_by_author(user.id, params.requested_page(), &media)
        .await?;

    let following = match viewer {
        Some(viewer) => Some(
            FollowService::new(db)
                .is_following(viewer.user_id, user.id)
                .await?,
        ),
        None => None,
    };

    Ok(View::render(
        PROFILE_TEMPLATE,
        ProfileContext {
            author,
            page_obj,
            following,
        },
    ))
}
