use crate::{
    error::{AppError, AppResult},
    forms::auth::USERNAME_TAKEN,
    models::{user, User, UserModel},
    utils::{encode_session_token, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a regular user. Input is expected to be validated already.
    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> AppResult<UserModel> {
        self.create_user(username, email, password, user::ROLE_USER)
            .await
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
        role: &str,
    ) -> AppResult<UserModel> {
        if self.username_taken(username).await? {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email.map(str::to_string)),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(role.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        tracing::info!("User {} registered with id {}", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and mint a session token.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!("Wrong password for {}", username);
            return Err(AppError::Unauthorized);
        }

        let token = encode_session_token(user.id)?;
        Ok((user, token))
    }

    pub async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(User::find()
            .filter(user::Column::Username.eq(username))
            .count(&self.db)
            .await?
            > 0)
    }
}
