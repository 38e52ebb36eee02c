use crate::{
    error::{AppError, AppResult},
    models::{comment, follow, post, user, Comment, Follow, Post, User, UserModel},
    response::{PageInfo, PaginatedResponse},
    services::{group::GroupService, user::UserService},
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;

pub const ADMIN_PER_PAGE: u64 = 100;

/// Placeholder shown for absent values in admin listings.
pub const EMPTY_VALUE: &str = "-empty-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubDateFilter {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl FromStr for PubDateFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "past_7_days" => Ok(Self::Past7Days),
            "this_month" => Ok(Self::ThisMonth),
            "this_year" => Ok(Self::ThisYear),
            other => Err(AppError::Validation(format!(
                "Unknown pub_date filter '{}'",
                other
            ))),
        }
    }
}

impl PubDateFilter {
    /// Half-open `[start, end)` range relative to `now`.
    pub fn range(self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let today = now.date();
        let end = (today + Duration::days(1)).and_time(NaiveTime::MIN);
        let start = match self {
            Self::Today => today,
            Self::Past7Days => today - Duration::days(7),
            Self::ThisMonth => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        (start.and_time(NaiveTime::MIN), end)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPostRow {
    pub pk: i32,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub author: String,
    pub group: String,
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminGroupRow {
    pub pk: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCommentRow {
    pub pk: i32,
    pub post: i32,
    pub author: String,
    pub text: String,
    pub created: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminFollowRow {
    pub pk: i32,
    pub user: String,
    pub author: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserRow {
    pub pk: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

fn or_empty(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| EMPTY_VALUE.to_string())
}

pub struct AdminService {
    db: DatabaseConnection,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn page<E>(&self, query: Select<E>, requested: u64) -> AppResult<(Vec<E::Model>, PageInfo)>
    where
        E: EntityTrait,
        E::Model: FromQueryResult + Send + Sync,
    {
        let paginator = query.paginate(&self.db, ADMIN_PER_PAGE);
        let count = paginator.num_items().await?;
        let info = PageInfo::new(requested, count, ADMIN_PER_PAGE);
        let rows = paginator.fetch_page(info.index()).await?;
        Ok((rows, info))
    }

    pub async fn list_posts(
        &self,
        search: Option<&str>,
        pub_date: Option<PubDateFilter>,
        requested: u64,
    ) -> AppResult<PaginatedResponse<AdminPostRow>> {
        let mut query = Post::find();
        if let Some(q) = search.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(post::Column::Text.contains(q));
        }
        if let Some(filter) = pub_date {
            let (start, end) = filter.range(chrono::Utc::now().naive_utc());
            query = query
                .filter(post::Column::PubDate.gte(start))
                .filter(post::Column::PubDate.lt(end));
        }
        let query = query
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id);

        let (posts, info) = self.page(query, requested).await?;

        let usernames = UserService::new(self.db.clone())
            .usernames(posts.iter().map(|p| p.author_id).collect())
            .await?;
        let groups = GroupService::new(self.db.clone())
            .refs(posts.iter().filter_map(|p| p.group_id).collect())
            .await?;

        let rows = posts
            .into_iter()
            .map(|p| AdminPostRow {
                pk: p.id,
                author: or_empty(usernames.get(&p.author_id).cloned()),
                group: or_empty(p.group_id.and_then(|g| groups.get(&g)).map(|g| g.title.clone())),
                image: or_empty(p.image),
                text: p.text,
                pub_date: p.pub_date,
            })
            .collect();
        Ok(PaginatedResponse::new(rows, info))
    }

    pub async fn list_groups(&self) -> AppResult<Vec<AdminGroupRow>> {
        let groups = GroupService::new(self.db.clone()).list().await?;
        Ok(groups
            .into_iter()
            .map(|g| AdminGroupRow {
                pk: g.id,
                title: g.title,
                slug: g.slug,
                description: or_empty(g.description),
            })
            .collect())
    }

    pub async fn list_comments(&self, requested: u64) -> AppResult<PaginatedResponse<AdminCommentRow>> {
        let query = Comment::find()
            .order_by_desc(comment::Column::Created)
            .order_by_desc(comment::Column::Id);
        let (comments, info) = self.page(query, requested).await?;

        let usernames = UserService::new(self.db.clone())
            .usernames(comments.iter().map(|c| c.author_id).collect())
            .await?;

        let rows = comments
            .into_iter()
            .map(|c| AdminCommentRow {
                pk: c.id,
                post: c.post_id,
                author: or_empty(usernames.get(&c.author_id).cloned()),
                text: c.text,
                created: c.created,
            })
            .collect();
        Ok(PaginatedResponse::new(rows, info))
    }

    pub async fn list_follows(&self, requested: u64) -> AppResult<PaginatedResponse<AdminFollowRow>> {
        let query = Follow::find().order_by_desc(follow::Column::Id);
        let (follows, info) = self.page(query, requested).await?;

        let ids = follows
            .iter()
            .flat_map(|f| [f.user_id, f.author_id])
            .collect();
        let usernames = UserService::new(self.db.clone()).usernames(ids).await?;

        let rows = follows
            .into_iter()
            .map(|f| AdminFollowRow {
                pk: f.id,
                user: or_empty(usernames.get(&f.user_id).cloned()),
                author: or_empty(usernames.get(&f.author_id).cloned()),
            })
            .collect();
        Ok(PaginatedResponse::new(rows, info))
    }

    pub async fn list_users(&self, requested: u64) -> AppResult<PaginatedResponse<AdminUserRow>> {
        let query = User::find().order_by_asc(user::Column::Username);
        let (users, info) = self.page(query, requested).await?;
        let rows = users
            .into_iter()
            .map(|u| AdminUserRow {
                pk: u.id,
                username: u.username,
                email: or_empty(u.email),
                role: u.role,
                created_at: u.created_at,
            })
            .collect();
        Ok(PaginatedResponse::new(rows, info))
    }

    pub async fn update_user_role(&self, user_id: i32, role: &str) -> AppResult<UserModel> {
        let valid_roles = [user::ROLE_USER, user::ROLE_ADMIN];
        if !valid_roles.contains(&role) {
            return Err(AppError::Validation(format!(
                "Invalid role. Must be one of: {}",
                valid_roles.join(", ")
            )));
        }

        let existing = UserService::new(self.db.clone()).get_by_id(user_id).await?;

        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(role.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        tracing::info!("User {} role set to {}", updated.username, role);
        Ok(updated)
    }

    /// Removes the user's posts, comments and follows with it.
    pub async fn delete_user(&self, user_id: i32) -> AppResult<()> {
        let result = User::delete_by_id(user_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Admin deleted user {}", user_id);
        Ok(())
    }

    pub async fn delete_post(&self, post_id: i32) -> AppResult<()> {
        let result = Post::delete_by_id(post_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Admin deleted post {}", post_id);
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: i32) -> AppResult<()> {
        let result = Comment::delete_by_id(comment_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Admin deleted comment {}", comment_id);
        Ok(())
    }

    pub async fn delete_follow(&self, follow_id: i32) -> AppResult<()> {
        let result = Follow::delete_by_id(follow_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn parses_known_filters_only() {
        assert_eq!("today".parse::<PubDateFilter>().unwrap(), PubDateFilter::Today);
        assert_eq!(
            "past_7_days".parse::<PubDateFilter>().unwrap(),
            PubDateFilter::Past7Days
        );
        assert!("yesterday".parse::<PubDateFilter>().is_err());
    }

    #[test]
    fn ranges_end_at_tomorrow_midnight() {
        let now = midnight(2024, 3, 15) + Duration::hours(13);
        let tomorrow = midnight(2024, 3, 16);

        assert_eq!(
            PubDateFilter::Today.range(now),
            (midnight(2024, 3, 15), tomorrow)
        );
        assert_eq!(PubDateFilter::Past7Days.range(now).0, midnight(2024, 3, 8));
        assert_eq!(PubDateFilter::ThisMonth.range(now).0, midnight(2024, 3, 1));
        assert_eq!(PubDateFilter::ThisYear.range(now), (midnight(2024, 1, 1), tomorrow));
    }

    #[test]
    fn blank_values_display_placeholder() {
        assert_eq!(or_empty(None), EMPTY_VALUE);
        assert_eq!(or_empty(Some(String::new())), EMPTY_VALUE);
        assert_eq!(or_empty(Some("x".into())), "x");
    }
}
