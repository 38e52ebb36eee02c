use crate::{
    error::{AppError, AppResult},
    models::{flatpage, FlatPage, FlatPageModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FlatPageInput {
    /// Path the page is served at, with leading and trailing slash.
    #[validate(custom(function = "validate_page_url"))]
    pub url: String,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub registration_required: bool,
}

fn validate_page_url(url: &str) -> Result<(), validator::ValidationError> {
    let ok = url.len() <= 100
        && url.starts_with('/')
        && url.ends_with('/')
        && !url.contains("//")
        && url
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '/'));
    if ok {
        Ok(())
    } else {
        Err(crate::forms::error(
            "url",
            "URL must start and end with a slash and contain only letters, numbers, dots, underscores, dashes, tildes or slashes.",
        ))
    }
}

/// Lookup key for a requested page path: always rooted.
pub fn page_url(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub struct FlatPageService {
    db: DatabaseConnection,
}

impl FlatPageService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_url(&self, url: &str) -> AppResult<Option<FlatPageModel>> {
        Ok(FlatPage::find()
            .filter(flatpage::Column::Url.eq(url))
            .one(&self.db)
            .await?)
    }

    pub async fn list(&self) -> AppResult<Vec<FlatPageModel>> {
        Ok(FlatPage::find()
            .order_by_asc(flatpage::Column::Url)
            .all(&self.db)
            .await?)
    }

    pub async fn create(&self, input: FlatPageInput) -> AppResult<FlatPageModel> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.ensure_url_free(&input.url, None).await?;

        let model = flatpage::ActiveModel {
            url: sea_orm::ActiveValue::Set(input.url),
            title: sea_orm::ActiveValue::Set(input.title.trim().to_string()),
            content: sea_orm::ActiveValue::Set(input.content),
            registration_required: sea_orm::ActiveValue::Set(input.registration_required),
            ..Default::default()
        };
        let page = model.insert(&self.db).await?;
        tracing::info!("Flat page {} created", page.url);
        Ok(page)
    }

    pub async fn update(&self, id: i32, input: FlatPageInput) -> AppResult<FlatPageModel> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let existing = FlatPage::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        self.ensure_url_free(&input.url, Some(id)).await?;

        let mut model: flatpage::ActiveModel = existing.into();
        model.url = sea_orm::ActiveValue::Set(input.url);
        model.title = sea_orm::ActiveValue::Set(input.title.trim().to_string());
        model.content = sea_orm::ActiveValue::Set(input.content);
        model.registration_required = sea_orm::ActiveValue::Set(input.registration_required);
        Ok(model.update(&self.db).await?)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = FlatPage::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!("Flat page {} deleted", id);
        Ok(())
    }

    async fn ensure_url_free(&self, url: &str, except: Option<i32>) -> AppResult<()> {
        let mut query = FlatPage::find().filter(flatpage::Column::Url.eq(url));
        if let Some(id) = except {
            query = query.filter(flatpage::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(AppError::Conflict(format!("A page already exists at {}", url)));
        }
        Ok(())
    }
}
