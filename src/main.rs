use axum::Router;
use quill::config::{self, cache::CacheConfig, media::MediaConfig};
use quill::migration::Migrator;
use quill::services::cache::{PageCache, RedisStore};
use quill::services::media::MediaStorage;
use quill::{handlers, routes, services, utils};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        // Posts
        handlers::post::index,
        handlers::post::group_posts,
        handlers::post::new_post_form,
        handlers::post::new_post,
        handlers::post::post_view,
        handlers::post::post_edit_form,
        handlers::post::post_edit,
        // Comments
        handlers::comment::add_comment,
        // Profiles & follows
        handlers::profile::profile,
        handlers::follow::follow_index,
        handlers::follow::profile_follow,
        handlers::follow::profile_unfollow,
        // Static pages
        handlers::flatpage::flatpage,
        handlers::flatpage::named_flatpage,
        // Auth
        handlers::auth::login_form,
        handlers::auth::login,
        handlers::auth::signup_form,
        handlers::auth::signup,
        handlers::auth::logout,
        // Admin
        handlers::admin::list_posts,
        handlers::admin::delete_post,
        handlers::admin::list_groups,
        handlers::admin::create_group,
        handlers::admin::update_group,
        handlers::admin::delete_group,
        handlers::admin::list_flatpages,
        handlers::admin::create_flatpage,
        handlers::admin::update_flatpage,
        handlers::admin::delete_flatpage,
        handlers::admin::list_comments,
        handlers::admin::delete_comment,
        handlers::admin::list_follows,
        handlers::admin::delete_follow,
        handlers::admin::list_users,
        handlers::admin::update_user_role,
        handlers::admin::delete_user,
    ),
    components(
        schemas(
            quill::response::PageInfo,
            quill::response::PaginationQuery,
            quill::error::AppError,
            quill::services::post::PostView,
            quill::services::post::AuthorRef,
            quill::services::group::GroupRef,
            quill::services::group::GroupInput,
            quill::services::comment::CommentView,
            quill::services::user::ProfileSummary,
            quill::forms::CommentForm,
            quill::forms::LoginForm,
            quill::forms::SignupForm,
            handlers::post::IndexContext,
            handlers::post::GroupContext,
            handlers::post::PostFormContext,
            handlers::post::PostDetailContext,
            handlers::profile::ProfileContext,
            handlers::follow::FollowContext,
            quill::services::flatpage::FlatPageInput,
            handlers::flatpage::FlatPageContext,
            handlers::auth::LoginContext,
            handlers::auth::SignupContext,
            handlers::admin::UpdateRoleRequest,
            handlers::admin::AdminUserResponse,
        )
    ),
    tags(
        (name = "posts", description = "Feed, groups, post pages and the post form"),
        (name = "comments", description = "Commenting on posts"),
        (name = "profiles", description = "User profiles"),
        (name = "follows", description = "Following authors and the followed feed"),
        (name = "pages", description = "Static pages"),
        (name = "auth", description = "Login, signup and logout"),
        (name = "admin", description = "Administrative operations"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let auth_config = config::auth::AuthConfig::from_env()?;
    utils::init_auth_config(auth_config)?;

    let media_config = MediaConfig::from_env();
    std::fs::create_dir_all(&media_config.root).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create media directory '{}': {}",
            media_config.root.display(),
            e
        )
    })?;

    tracing::info!("Starting quill v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_admin::ensure_bootstrap_admin(&db).await?;

    let cache = build_page_cache(CacheConfig::from_env()).await;

    let app = routes::build_app(db, cache, MediaStorage::new(media_config));
    let app = with_transport_layers(app);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Redis when `REDIS_URL` is set and reachable, otherwise in-process.
async fn build_page_cache(config: CacheConfig) -> PageCache {
    let Some(url) = config::redis::redis_url() else {
        tracing::info!("REDIS_URL not set, using in-memory page cache");
        return PageCache::in_memory(config.page_ttl);
    };

    match config::redis::get_redis(&url).await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            PageCache::new(Arc::new(RedisStore::new(conn)), config.page_ttl)
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, using in-memory page cache: {}", e);
            PageCache::in_memory(config.page_ttl)
        }
    }
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn with_transport_layers(app: Router) -> Router {
    app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
