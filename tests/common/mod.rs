#![allow(dead_code)]

use quill::config::{auth::AuthConfig, media::MediaConfig};
use quill::forms::{CleanedPost, ImageChange};
use quill::models::{GroupModel, PostModel, UserModel};
use quill::services::{
    auth::AuthService,
    cache::PageCache,
    group::{GroupInput, GroupService},
    media::MediaStorage,
    post::PostService,
};
use reqwest::{header, Client, Response, StatusCode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use std::time::Duration;

static INIT: Once = Once::new();
static APP_COUNTER: AtomicUsize = AtomicUsize::new(0);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const TEST_PASSWORD: &str = "test_password_123";

fn init_auth() {
    INIT.call_once(|| {
        let _ = quill::utils::init_auth_config(AuthConfig {
            secret: "integration_test_secret_that_is_at_least_32_characters_long".to_string(),
            session_ttl_secs: 3600,
            bcrypt_cost: 4,
            cookie_secure: false,
        });
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub media: MediaStorage,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub fn media_root(&self) -> PathBuf {
        self.media.config().root.clone()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header(header::COOKIE, session_cookie(token));
        }
        request.send().await.unwrap()
    }

    /// GET a view and return its status and `{template, context}` body.
    pub async fn get_view(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let resp = self.get(path, token).await;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap();
        (status, body)
    }

    pub async fn post_form(&self, path: &str, token: Option<&str>, form: &[(&str, &str)]) -> Response {
        let mut request = self.client.post(self.url(path)).form(form);
        if let Some(token) = token {
            request = request.header(header::COOKIE, session_cookie(token));
        }
        request.send().await.unwrap()
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        token: Option<&str>,
        form: reqwest::multipart::Form,
    ) -> Response {
        let mut request = self.client.post(self.url(path)).multipart(form);
        if let Some(token) = token {
            request = request.header(header::COOKIE, session_cookie(token));
        }
        request.send().await.unwrap()
    }
}

/// Feed caching is disabled so each request sees current data.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_cache_ttl(Duration::ZERO).await
}

pub async fn spawn_app_with_cache_ttl(ttl: Duration) -> TestApp {
    init_auth();

    // one connection: every in-memory SQLite connection is its own database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");

    quill::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let n = APP_COUNTER.fetch_add(1, Ordering::SeqCst);
    let media_root = std::env::temp_dir().join(format!("quill-test-{}-{}", std::process::id(), n));
    let media = MediaStorage::new(MediaConfig::new(&media_root, "/media/", true));

    let app = quill::routes::build_app(db.clone(), PageCache::in_memory(ttl), media.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
        media,
    }
}

pub fn session_cookie(token: &str) -> String {
    format!("session={}", token)
}

/// Create a user directly and return it with a session token.
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (UserModel, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("{}_{}", username_prefix, counter);

    let user = AuthService::new(app.db.clone())
        .register(&username, None, TEST_PASSWORD)
        .await
        .expect("Failed to create test user");
    let token = quill::utils::encode_session_token(user.id).unwrap();
    (user, token)
}

pub async fn make_admin(app: &TestApp, user_id: i32) {
    quill::services::admin::AdminService::new(app.db.clone())
        .update_user_role(user_id, "admin")
        .await
        .expect("Failed to promote user");
}

pub async fn create_test_group(app: &TestApp, slug: &str) -> GroupModel {
    GroupService::new(app.db.clone())
        .create(GroupInput {
            title: format!("Group {}", slug),
            slug: slug.to_string(),
            description: Some("Test group".to_string()),
        })
        .await
        .expect("Failed to create test group")
}

pub async fn create_test_post(
    app: &TestApp,
    author_id: i32,
    text: &str,
    group_id: Option<i32>,
) -> PostModel {
    PostService::new(app.db.clone())
        .create(
            author_id,
            CleanedPost {
                text: text.to_string(),
                group_id,
                image: ImageChange::Keep,
            },
            &app.media,
        )
        .await
        .expect("Failed to create test post")
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Texts of the posts on a paginated view.
pub fn page_texts(body: &Value) -> Vec<String> {
    body["context"]["page_obj"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p["text"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 30, 30]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
