use crate::{
    error::{AppError, AppResult},
    models::{group, Group, GroupModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

/// Short reference to a group, embedded in every post view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroupRef {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

impl From<&GroupModel> for GroupRef {
    fn from(group: &GroupModel) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GroupInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub description: Option<String>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let ok = !slug.is_empty()
        && slug.len() <= 50
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(crate::forms::error(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        ))
    }
}

pub struct GroupService {
    db: DatabaseConnection,
}

impl GroupService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<GroupModel> {
        Group::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(Group::find_by_id(id).count(&self.db).await? > 0)
    }

    pub async fn list(&self) -> AppResult<Vec<GroupModel>> {
        Ok(Group::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await?)
    }

    pub async fn refs(&self, ids: Vec<i32>) -> AppResult<HashMap<i32, GroupRef>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let groups = Group::find()
            .filter(group::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(groups.iter().map(|g| (g.id, GroupRef::from(g))).collect())
    }

    pub async fn create(&self, input: GroupInput) -> AppResult<GroupModel> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.ensure_slug_free(&input.slug, None).await?;

        let model = group::ActiveModel {
            title: sea_orm::ActiveValue::Set(input.title.trim().to_string()),
            slug: sea_orm::ActiveValue::Set(input.slug),
            description: sea_orm::ActiveValue::Set(non_blank(input.description)),
            ..Default::default()
        };
        let group = model.insert(&self.db).await?;
        tracing::info!("Group {} created", group.slug);
        Ok(group)
    }

    pub async fn update(&self, slug: &str, input: GroupInput) -> AppResult<GroupModel> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let existing = self.get_by_slug(slug).await?;
        self.ensure_slug_free(&input.slug, Some(existing.id)).await?;

        let mut model: group::ActiveModel = existing.into();
        model.title = sea_orm::ActiveValue::Set(input.title.trim().to_string());
        model.slug = sea_orm::ActiveValue::Set(input.slug);
        model.description = sea_orm::ActiveValue::Set(non_blank(input.description));
        Ok(model.update(&self.db).await?)
    }

    /// Posts in the group survive with their group cleared.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let existing = self.get_by_slug(slug).await?;
        Group::delete_by_id(existing.id).exec(&self.db).await?;
        tracing::info!("Group {} deleted", slug);
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<i32>) -> AppResult<()> {
        let mut query = Group::find().filter(group::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(group::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(AppError::Conflict(format!("Group slug '{}' is taken", slug)));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
