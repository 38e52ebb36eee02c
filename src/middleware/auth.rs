use crate::{
    error::AppError,
    models::{User, UserModel},
    utils::{
        cookie::{extract_cookie, SESSION_COOKIE},
        jwt::decode_session_token,
        next_url::login_redirect_target,
    },
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// The authenticated identity for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::user::ROLE_ADMIN
    }
}

impl From<UserModel> for AuthUser {
    fn from(user: UserModel) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Identity middleware, applied to every route.
///
/// Reads `Authorization: Bearer` or the `session` cookie. A missing, expired
/// or forged token, or one for a deleted user, leaves the request anonymous.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).or_else(|| extract_cookie(&headers, SESSION_COOKIE));

    if let Some(token) = token {
        match decode_session_token(&token).ok().and_then(|c| c.user_id()) {
            Some(user_id) => {
                if let Some(user) = User::find_by_id(user_id).one(&db).await? {
                    request.extensions_mut().insert(AuthUser::from(user));
                } else {
                    tracing::debug!("Session token for missing user {}", user_id);
                }
            }
            None => tracing::debug!("Ignoring invalid session token"),
        }
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Route layer for pages that need a logged-in user. Anonymous requests are
/// sent to the login page with the original path as `next`; the handler
/// never runs.
pub async fn login_required(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthUser>().is_some() {
        return next.run(request).await;
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&login_redirect_target(path_and_query)).into_response()
}

/// Route layer for the admin API: 401 when anonymous, 403 for non-admins.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;
    if !user.is_admin() {
        tracing::warn!("User {} denied admin access", user.username);
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer "),
        );
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic Zm9vOmJhcg=="),
        );
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
