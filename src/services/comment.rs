use crate::{
    error::AppResult,
    models::{comment, Comment, CommentModel},
    services::{post::AuthorRef, user::UserService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommentView {
    pub id: i32,
    pub post_id: i32,
    pub text: String,
    pub created: chrono::NaiveDateTime,
    pub author: AuthorRef,
}

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first.
    pub async fn list_by_post(&self, post_id: i32) -> AppResult<Vec<CommentView>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::Created)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await?;
        self.hydrate(comments).await
    }

    /// `author_id` is the authenticated user; the form never carries one.
    pub async fn create(&self, post_id: i32, author_id: i32, text: &str) -> AppResult<CommentModel> {
        let model = comment::ActiveModel {
            post_id: sea_orm::ActiveValue::Set(post_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            text: sea_orm::ActiveValue::Set(text.trim().to_string()),
            created: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let comment = model.insert(&self.db).await?;
        tracing::info!("Comment {} added to post {} by user {}", comment.id, post_id, author_id);
        Ok(comment)
    }

    pub async fn hydrate(&self, comments: Vec<CommentModel>) -> AppResult<Vec<CommentView>> {
        let ids = comments.iter().map(|c| c.author_id).collect();
        let usernames = UserService::new(self.db.clone()).usernames(ids).await?;

        Ok(comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                post_id: c.post_id,
                author: AuthorRef {
                    id: c.author_id,
                    username: usernames.get(&c.author_id).cloned().unwrap_or_default(),
                },
                text: c.text,
                created: c.created,
            })
            .collect())
    }
}
