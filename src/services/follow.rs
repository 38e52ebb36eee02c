use crate::{
    error::AppResult,
    models::{follow, Follow},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct FollowService {
    db: DatabaseConnection,
}

impl FollowService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the subscription if it is missing. Following yourself is
    /// ignored. Returns true when a new row was written.
    pub async fn follow(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        if user_id == author_id {
            tracing::debug!("User {} tried to follow themselves, ignoring", user_id);
            return Ok(false);
        }

        if self.is_following(user_id, author_id).await? {
            return Ok(false);
        }

        let model = follow::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(_) => {
                tracing::info!("User {} now follows {}", user_id, author_id);
                Ok(true)
            }
            // a concurrent request may have inserted the pair first
            Err(e) => {
                if self.is_following(user_id, author_id).await? {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Remove the subscription if present. Returns true when a row was deleted.
    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!("User {} unfollowed {}", user_id, author_id);
        }
        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(&self, user_id: i32, author_id: i32) -> AppResult<bool> {
        let count = Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn follower_count(&self, author_id: i32) -> AppResult<u64> {
        Ok(Follow::find()
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?)
    }

    pub async fn following_count(&self, user_id: i32) -> AppResult<u64> {
        Ok(Follow::find()
            .filter(follow::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?)
    }
}
