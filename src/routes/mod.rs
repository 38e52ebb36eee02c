use crate::config::media::MediaConfig;
use crate::forms::upload::MAX_IMAGE_SIZE;
use crate::handlers;
use crate::middleware::{
    auth_middleware, error_page_middleware, login_required, panic_page, require_admin,
    security_headers_middleware,
};
use crate::services::{cache::PageCache, media::MediaStorage};
use axum::{extract::DefaultBodyLimit, middleware, routing, Extension, Router};
use sea_orm::DatabaseConnection;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;

/// Request body cap for post submissions; leaves room above the image limit
/// so oversized images are reported as a form error.
pub const MAX_POST_BODY: usize = MAX_IMAGE_SIZE * 2;

/// The full application: routes, error pages, identity and the injected
/// collaborators. Transport concerns (tracing, CORS, docs) are added by the
/// binary.
pub fn build_app(db: DatabaseConnection, cache: PageCache, media: MediaStorage) -> Router {
    let mut app = create_routes();

    if let Some(router) = media_routes(media.config()) {
        app = app.merge(router);
    }

    app.fallback(handlers::error::page_not_found)
        .layer(middleware::from_fn(auth_middleware))
        .layer(middleware::from_fn(error_page_middleware))
        .layer(CatchPanicLayer::custom(panic_page))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(Extension(db))
        .layer(Extension(cache))
        .layer(Extension(media))
}

pub fn create_routes() -> Router {
    let admin = admin_routes().route_layer(middleware::from_fn(require_admin));
    let protected = protected_routes().route_layer(middleware::from_fn(login_required));

    public_routes()
        .merge(protected)
        .nest("/admin", admin)
}

fn public_routes() -> Router {
    Router::new()
        .route("/", routing::get(handlers::post::index))
        .route("/health", routing::get(handlers::health::health_check))
        .route("/group/{slug}/", routing::get(handlers::post::group_posts))
        .route(
            "/auth/login/",
            routing::get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route(
            "/auth/signup/",
            routing::get(handlers::auth::signup_form).post(handlers::auth::signup),
        )
        .route(
            "/auth/logout/",
            routing::get(handlers::auth::logout).post(handlers::auth::logout),
        )
        .route("/about/{*url}", routing::get(handlers::flatpage::flatpage))
        .route("/about-author/", routing::get(handlers::flatpage::named_flatpage))
        .route("/about-spec/", routing::get(handlers::flatpage::named_flatpage))
        .route("/about-us/", routing::get(handlers::flatpage::named_flatpage))
        .route("/terms/", routing::get(handlers::flatpage::named_flatpage))
        .route("/{username}/", routing::get(handlers::profile::profile))
        .route(
            "/{username}/{post_id}/",
            routing::get(handlers::post::post_view),
        )
}

/// Routes that need a logged-in user; anonymous requests go to the login page.
fn protected_routes() -> Router {
    Router::new()
        .route(
            "/new/",
            routing::get(handlers::post::new_post_form).post(handlers::post::new_post),
        )
        .route("/follow/", routing::get(handlers::follow::follow_index))
        .route(
            "/{username}/{post_id}/edit/",
            routing::get(handlers::post::post_edit_form).post(handlers::post::post_edit),
        )
        .route(
            "/{username}/{post_id}/comment/",
            routing::post(handlers::comment::add_comment),
        )
        .route(
            "/{username}/follow/",
            routing::get(handlers::follow::profile_follow),
        )
        .route(
            "/{username}/unfollow/",
            routing::get(handlers::follow::profile_unfollow),
        )
        .layer(DefaultBodyLimit::max(MAX_POST_BODY))
}

fn admin_routes() -> Router {
    Router::new()
        .route("/posts/", routing::get(handlers::admin::list_posts))
        .route("/posts/{id}", routing::delete(handlers::admin::delete_post))
        .route(
            "/groups/",
            routing::get(handlers::admin::list_groups).post(handlers::admin::create_group),
        )
        .route(
            "/groups/{slug}",
            routing::put(handlers::admin::update_group).delete(handlers::admin::delete_group),
        )
        .route(
            "/flatpages/",
            routing::get(handlers::admin::list_flatpages).post(handlers::admin::create_flatpage),
        )
        .route(
            "/flatpages/{id}",
            routing::put(handlers::admin::update_flatpage).delete(handlers::admin::delete_flatpage),
        )
        .route("/comments/", routing::get(handlers::admin::list_comments))
        .route(
            "/comments/{id}",
            routing::delete(handlers::admin::delete_comment),
        )
        .route("/follows/", routing::get(handlers::admin::list_follows))
        .route(
            "/follows/{id}",
            routing::delete(handlers::admin::delete_follow),
        )
        .route("/users/", routing::get(handlers::admin::list_users))
        .route("/users/{id}", routing::delete(handlers::admin::delete_user))
        .route(
            "/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
}

/// Serves uploaded files at the media URL prefix when enabled. A bare `/`
/// prefix cannot be mounted.
fn media_routes(config: &MediaConfig) -> Option<Router> {
    if !config.serve {
        return None;
    }
    let prefix = config.url.trim_end_matches('/');
    if prefix.is_empty() {
        tracing::warn!("MEDIA_URL {} cannot be served locally", config.url);
        return None;
    }
    Some(Router::new().nest_service(prefix, ServeDir::new(&config.root)))
}
