use crate::error::AppResult;
use crate::forms::{field_errors, BoundForm, CommentForm};
use crate::handlers::post::{detail_context, parse_post_id, post_url, POST_TEMPLATE};
use crate::middleware::auth::AuthUser;
use crate::response::View;
use crate::services::comment::CommentService;
use crate::services::media::MediaStorage;
use crate::services::post::PostService;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/{username}/{post_id}/comment/",
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment added, redirect to the post"),
        (status = 200, description = "Post redisplayed with comment errors", body = crate::handlers::post::PostDetailContext),
        (status = 404, description = "No such post for this author"),
    ),
    tag = "comments"
)]
pub async fn add_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    auth_user: AuthUser,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_id = parse_post_id(&post_id)?;
    let post = PostService::new(db.clone())
        .get_by_author_and_id(&username, post_id)
        .await?;

    if let Err(e) = form.validate() {
        let bound = BoundForm::with_errors(form, field_errors(&e));
        let context = detail_context(&db, &media, post, bound, true).await?;
        return Ok(View::render(POST_TEMPLATE, context).into_response());
    }

    CommentService::new(db)
        .create(post.id, auth_user.user_id, &form.text)
        .await?;
    Ok(Redirect::to(&post_url(&username, post.id)).into_response())
}
