use crate::error::{AppError, AppResult};
use crate::forms::auth::{LoginFormData, SignupFormData, INVALID_LOGIN, USERNAME_TAKEN};
use crate::forms::{
    add_error, field_errors, BoundForm, FieldErrors, LoginForm, SignupForm, NON_FIELD_ERRORS,
};
use crate::response::View;
use crate::services::auth::AuthService;
use crate::utils::{
    auth_config,
    cookie::{build_clear_cookie, build_session_cookie},
    encode_session_token,
    next_url::safe_next,
};
use anyhow::anyhow;
use axum::{
    extract::Query,
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const LOGIN_TEMPLATE: &str = "registration/login.html";
pub const SIGNUP_TEMPLATE: &str = "registration/signup.html";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NextQuery {
    /// Local path to return to after logging in
    pub next: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginContext {
    pub form: BoundForm<LoginFormData>,
    pub next: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupContext {
    pub form: BoundForm<SignupFormData>,
}

#[utoipa::path(
    get,
    path = "/auth/login/",
    params(NextQuery),
    responses((status = 200, description = "Login form", body = LoginContext)),
    tag = "auth"
)]
pub async fn login_form(Query(query): Query<NextQuery>) -> View<LoginContext> {
    View::render(
        LOGIN_TEMPLATE,
        LoginContext {
            form: BoundForm::unbound(LoginFormData::default()),
            next: safe_next(query.next.as_deref()),
        },
    )
}

#[utoipa::path(
    post,
    path = "/auth/login/",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, session cookie set, redirect to `next`"),
        (status = 200, description = "Form redisplayed with errors", body = LoginContext),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(form.next.as_deref());

    if let Err(e) = form.validate() {
        return Ok(login_page(&form, field_errors(&e), next));
    }

    match AuthService::new(db).login(form.username.trim(), &form.password).await {
        Ok((user, token)) => {
            tracing::info!("User {} logged in", user.username);
            let mut response = Redirect::to(&next).into_response();
            set_session_cookie(&mut response, &token)?;
            Ok(response)
        }
        Err(AppError::Unauthorized) => {
            let mut errors = FieldErrors::new();
            add_error(&mut errors, NON_FIELD_ERRORS, INVALID_LOGIN);
            Ok(login_page(&form, errors, next))
        }
        Err(e) => Err(e),
    }
}

fn login_page(form: &LoginForm, errors: FieldErrors, next: String) -> Response {
    View::render(
        LOGIN_TEMPLATE,
        LoginContext {
            form: BoundForm::with_errors(form.data(), errors),
            next,
        },
    )
    .into_response()
}

#[utoipa::path(
    get,
    path = "/auth/signup/",
    responses((status = 200, description = "Signup form", body = SignupContext)),
    tag = "auth"
)]
pub async fn signup_form() -> View<SignupContext> {
    View::render(
        SIGNUP_TEMPLATE,
        SignupContext {
            form: BoundForm::unbound(SignupFormData::default()),
        },
    )
}

#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created and logged in, redirect to the feed"),
        (status = 200, description = "Form redisplayed with errors", body = SignupContext),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    if let Err(e) = form.validate() {
        return Ok(signup_page(&form, field_errors(&e)));
    }

    let service = AuthService::new(db);
    let user = match service
        .register(&form.username, form.email.as_deref(), &form.password1)
        .await
    {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            let mut errors = FieldErrors::new();
            add_error(&mut errors, "username", USERNAME_TAKEN);
            return Ok(signup_page(&form, errors));
        }
        Err(e) => return Err(e),
    };

    let token = encode_session_token(user.id)?;
    let mut response = Redirect::to("/").into_response();
    set_session_cookie(&mut response, &token)?;
    Ok(response)
}

fn signup_page(form: &SignupForm, errors: FieldErrors) -> Response {
    View::render(
        SIGNUP_TEMPLATE,
        SignupContext {
            form: BoundForm::with_errors(form.data(), errors),
        },
    )
    .into_response()
}

#[utoipa::path(
    get,
    path = "/auth/logout/",
    responses((status = 303, description = "Session cookie cleared, redirect to the feed")),
    tag = "auth"
)]
pub async fn logout() -> AppResult<Response> {
    let secure = auth_config()?.cookie_secure;
    let mut response = Redirect::to("/").into_response();
    append_set_cookie(&mut response, &build_clear_cookie(secure))?;
    Ok(response)
}

fn set_session_cookie(response: &mut Response, token: &str) -> AppResult<()> {
    let config = auth_config()?;
    let cookie = build_session_cookie(token, config.session_ttl_secs, config.cookie_secure);
    append_set_cookie(response, &cookie)
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
