use crate::error::{AppError, AppResult};
use crate::forms::post::PostFormData;
use crate::forms::{BoundForm, CommentForm, PostForm};
use crate::middleware::auth::AuthUser;
use crate::models::{GroupModel, PostModel};
use crate::response::{PaginationQuery, View};
use crate::services::cache::PageCache;
use crate::services::comment::{CommentService, CommentView};
use crate::services::group::GroupService;
use crate::services::media::MediaStorage;
use crate::services::post::{PostPage, PostService, PostView};
use crate::services::user::{ProfileSummary, UserService};
use axum::{
    extract::{Path, Query},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_TEMPLATE: &str = "group.html";
pub const POST_FORM_TEMPLATE: &str = "posts/new_post.html";
pub const POST_TEMPLATE: &str = "posts/post.html";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexContext {
    pub page_obj: PostPage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupContext {
    pub group: GroupModel,
    pub page_obj: PostPage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostFormContext {
    pub form: BoundForm<PostFormData>,
    pub groups: Vec<GroupModel>,
    pub is_edit: bool,
    pub post: Option<PostView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailContext {
    pub post: PostView,
    pub author: ProfileSummary,
    pub comments: Vec<CommentView>,
    pub form: BoundForm<CommentForm>,
    /// True when the comment form is being redisplayed with errors.
    pub comment: bool,
}

/// Path segment that must be a post id; anything else is a 404.
pub(crate) fn parse_post_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::NotFound)
}

fn index_key(page: u64) -> String {
    PageCache::view_key("index", &[&page.to_string()])
}

pub(crate) fn post_url(username: &str, post_id: i32) -> String {
    format!("/{}/{}/", username, post_id)
}

#[utoipa::path(
    get,
    path = "/",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Feed of all posts, newest first", body = IndexContext),
    ),
    tag = "posts"
)]
pub async fn index(
    Extension(db): Extension<DatabaseConnection>,
    Extension(cache): Extension<PageCache>,
    Extension(media): Extension<MediaStorage>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<View<IndexContext>> {
    let page = params.requested_page();
    if let Some(context) = cache.get::<IndexContext>(&index_key(page)).await {
        tracing::debug!("Serving feed page {} from page cache", page);
        return Ok(View::render(INDEX_TEMPLATE, context));
    }

    let page_obj = PostService::new(db).list_all(page, &media).await?;
    // Out-of-range requests are stored under the page actually shown, so
    // arbitrary `?page=` values cannot grow the cache.
    let key = index_key(page_obj.paginator.number);
    let context = IndexContext { page_obj };
    cache.set(&key, &context).await;

    Ok(View::render(INDEX_TEMPLATE, context))
}

#[utoipa::path(
    get,
    path = "/group/{slug}/",
    params(
        ("slug" = String, Path, description = "Group slug"),
        PaginationQuery,
    ),
    responses(
        (status = 200, description = "Posts of one group", body = GroupContext),
        (status = 404, description = "Unknown group"),
    ),
    tag = "posts"
)]
pub async fn group_posts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<View<GroupContext>> {
    let group = GroupService::new(db.clone()).get_by_slug(&slug).await?;
    let page_obj = PostService::new(db)
        .list_by_group(group.id, params.requested_page(), &media)
        .await?;

    Ok(View::render(GROUP_TEMPLATE, GroupContext { group, page_obj }))
}

#[utoipa::path(
    get,
    path = "/new/",
    responses(
        (status = 200, description = "Empty post form", body = PostFormContext),
        (status = 303, description = "Redirect to login"),
    ),
    tag = "posts"
)]
pub async fn new_post_form(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
) -> AppResult<View<PostFormContext>> {
    let groups = GroupService::new(db).list().await?;
    Ok(View::render(
        POST_FORM_TEMPLATE,
        PostFormContext {
            form: BoundForm::unbound(PostFormData::default()),
            groups,
            is_edit: false,
            post: None,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/new/",
    request_body(content_type = "multipart/form-data", description = "text, group, image"),
    responses(
        (status = 303, description = "Post created, redirect to the feed"),
        (status = 200, description = "Form redisplayed with errors", body = PostFormContext),
    ),
    tag = "posts"
)]
pub async fn new_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    auth_user: AuthUser,
    form: PostForm,
) -> AppResult<Response> {
    let checker = GroupService::new(db.clone());
    match form.clean(|id| async move { checker.exists(id).await }).await {
        Ok(cleaned) => {
            PostService::new(db)
                .create(auth_user.user_id, cleaned, &media)
                .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let groups = GroupService::new(db).list().await?;
            let context = PostFormContext {
                form: BoundForm::with_errors(form.data(None), errors),
                groups,
                is_edit: false,
                post: None,
            };
            Ok(View::render(POST_FORM_TEMPLATE, context).into_response())
        }
    }
}

/// Shared by the detail page and the comment handler, which redisplays it
/// with a bound form.
pub(crate) async fn detail_context(
    db: &DatabaseConnection,
    media: &MediaStorage,
    post: PostModel,
    form: BoundForm<CommentForm>,
    comment: bool,
) -> AppResult<PostDetailContext> {
    let users = UserService::new(db.clone());
    let author = users.get_by_id(post.author_id).await?;
    let author = users.profile_summary(&author).await?;
    let comments = CommentService::new(db.clone()).list_by_post(post.id).await?;
    let post = PostService::new(db.clone()).view(post, media).await?;

    Ok(PostDetailContext {
        post,
        author,
        comments,
        form,
        comment,
    })
}

#[utoipa::path(
    get,
    path = "/{username}/{post_id}/",
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Post with comments", body = PostDetailContext),
        (status = 404, description = "No such post for this author"),
    ),
    tag = "posts"
)]
pub async fn post_view(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<View<PostDetailContext>> {
    let post_id = parse_post_id(&post_id)?;
    let post = PostService::new(db.clone())
        .get_by_author_and_id(&username, post_id)
        .await?;

    let context = detail_context(
        &db,
        &media,
        post,
        BoundForm::unbound(CommentForm::default()),
        false,
    )
    .await?;
    Ok(View::render(POST_TEMPLATE, context))
}

/// Loads the post for the edit routes. `Err(redirect)` when the viewer is
/// not the author.
async fn editable_post(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    username: &str,
    post_id: &str,
) -> AppResult<Result<PostModel, Response>> {
    let post_id = parse_post_id(post_id)?;
    let post = PostService::new(db.clone())
        .get_by_author_and_id(username, post_id)
        .await?;

    if post.author_id != auth_user.user_id {
        tracing::debug!(
            "User {} may not edit post {}, redirecting",
            auth_user.username,
            post.id
        );
        return Ok(Err(Redirect::to(&post_url(username, post.id)).into_response()));
    }
    Ok(Ok(post))
}

#[utoipa::path(
    get,
    path = "/{username}/{post_id}/edit/",
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Pre-filled post form", body = PostFormContext),
        (status = 303, description = "Not the author, redirect to the post"),
        (status = 404, description = "No such post for this author"),
    ),
    tag = "posts"
)]
pub async fn post_edit_form(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    auth_user: AuthUser,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let post = match editable_post(&db, &auth_user, &username, &post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let data = PostFormData {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
        image: post.image.as_deref().map(|path| media.url(path)),
    };
    let groups = GroupService::new(db.clone()).list().await?;
    let post = PostService::new(db).view(post, &media).await?;

    let context = PostFormContext {
        form: BoundForm::unbound(data),
        groups,
        is_edit: true,
        post: Some(post),
    };
    Ok(View::render(POST_FORM_TEMPLATE, context).into_response())
}

#[utoipa::path(
    post,
    path = "/{username}/{post_id}/edit/",
    params(
        ("username" = String, Path, description = "Author username"),
        ("post_id" = i32, Path, description = "Post ID"),
    ),
    request_body(content_type = "multipart/form-data", description = "text, group, image, image-clear"),
    responses(
        (status = 303, description = "Saved (or not the author), redirect to the post"),
        (status = 200, description = "Form redisplayed with errors", body = PostFormContext),
        (status = 404, description = "No such post for this author"),
    ),
    tag = "posts"
)]
pub async fn post_edit(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaStorage>,
    auth_user: AuthUser,
    Path((username, post_id)): Path<(String, String)>,
    form: PostForm,
) -> AppResult<Response> {
    let post = match editable_post(&db, &auth_user, &username, &post_id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let checker = GroupService::new(db.clone());
    match form.clean(|id| async move { checker.exists(id).await }).await {
        Ok(cleaned) => {
            let updated = PostService::new(db).update(post, cleaned, &media).await?;
            Ok(Redirect::to(&post_url(&username, updated.id)).into_response())
        }
        Err(errors) => {
            let current_image = post.image.as_deref().map(|path| media.url(path));
            let groups = GroupService::new(db.clone()).list().await?;
            let post = PostService::new(db).view(post, &media).await?;
            let context = PostFormContext {
                form: BoundForm::with_errors(form.data(current_image), errors),
                groups,
                is_edit: true,
                post: Some(post),
            };
            Ok(View::render(POST_FORM_TEMPLATE, context).into_response())
        }
    }
}
