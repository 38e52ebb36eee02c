use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    services::{follow::FollowService, post::PostService},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Public view of a user on a profile page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    pub id: i32,
    pub username: String,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        self.find_by_username(username)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    /// Usernames keyed by id, fetched in one query.
    pub async fn usernames(&self, ids: Vec<i32>) -> AppResult<HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = User::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    pub async fn profile_summary(&self, user: &UserModel) -> AppResult<ProfileSummary> {
        let post_count = PostService::new(self.db.clone())
            .count_by_author(user.id)
            .await?;
        let follows = FollowService::new(self.db.clone());
        let follower_count = follows.follower_count(user.id).await?;
        let following_count = follows.following_count(user.id).await?;

        Ok(ProfileSummary {
            id: user.id,
            username: user.username.clone(),
            post_count,
            follower_count,
            following_count,
        })
    }
}
