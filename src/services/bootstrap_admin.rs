use crate::error::AppResult;
use crate::models::{user, User};
use crate::services::auth::AuthService;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

impl BootstrapAdminConfig {
    /// Both `BOOTSTRAP_ADMIN_USERNAME` and `BOOTSTRAP_ADMIN_PASSWORD` must be set.
    pub fn from_env() -> Option<Self> {
        let username = env::var("BOOTSTRAP_ADMIN_USERNAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty())?;
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Some(Self {
            username,
            email,
            password,
        })
    }
}

/// Create or promote the configured admin at startup:
/// - an admin already exists: nothing to do
/// - the configured username exists: promote it
/// - otherwise: create it
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(user::ROLE_ADMIN))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(user::Column::Username.eq(cfg.username.clone()))
        .one(db)
        .await?;

    if let Some(found) = existing {
        let mut active: user::ActiveModel = found.into();
        active.role = sea_orm::ActiveValue::Set(user::ROLE_ADMIN.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        active.update(db).await?;
        tracing::info!("Promoted {} to admin", cfg.username);
        return Ok(());
    }

    AuthService::new(db.clone())
        .create_user(
            &cfg.username,
            cfg.email.as_deref(),
            &cfg.password,
            user::ROLE_ADMIN,
        )
        .await?;
    tracing::info!("Created bootstrap admin {}", cfg.username);
    Ok(())
}
