use super::upload::{validate_image, UploadedFile, INVALID_IMAGE};
use super::{add_error, error, field_errors, not_blank, FieldErrors, INVALID_CHOICE};
use crate::error::AppError;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Submitted post fields. There is deliberately no author field: the
/// author always comes from the authenticated identity.
#[derive(Debug, Default, Clone, Validate)]
pub struct PostForm {
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    #[validate(custom(function = "group_choice"))]
    pub group: Option<String>,
    /// Checked in `clean`, not by the derive.
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

fn group_choice(value: &str) -> Result<(), ValidationError> {
    value
        .trim()
        .parse::<i32>()
        .map(|_| ())
        .map_err(|_| error("invalid_choice", INVALID_CHOICE))
}

#[derive(Debug, Clone)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace { data: axum::body::Bytes, ext: &'static str },
}

/// Validated form contents, ready to be written by the post service.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: ImageChange,
}

/// What a template needs to redisplay the form.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostFormData {
    pub text: String,
    pub group: Option<String>,
    /// URL of the image currently attached (edit form only).
    pub image: Option<String>,
}

impl PostForm {
    /// Run the declarative checks, then resolve the group reference with
    /// `group_exists`. Returns the cleaned data or the field errors.
    pub async fn clean<F, Fut>(&self, group_exists: F) -> Result<CleanedPost, FieldErrors>
    where
        F: FnOnce(i32) -> Fut,
        Fut: std::future::Future<Output = Result<bool, AppError>>,
    {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors(&e),
        };

        let group_id = match self.group_id() {
            Some(id) if !errors.contains_key("group") => match group_exists(id).await {
                Ok(true) => Some(id),
                Ok(false) => {
                    add_error(&mut errors, "group", INVALID_CHOICE);
                    None
                }
                Err(e) => {
                    tracing::error!("Group lookup failed: {:?}", e);
                    add_error(&mut errors, "group", INVALID_CHOICE);
                    None
                }
            },
            _ => None,
        };

        let image = match &self.image {
            Some(file) => match validate_image(file) {
                Ok(ext) => ImageChange::Replace {
                    data: file.data.clone(),
                    ext,
                },
                Err(e) => {
                    let message = e
                        .message
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| INVALID_IMAGE.to_string());
                    add_error(&mut errors, "image", message);
                    ImageChange::Keep
                }
            },
            None if self.clear_image => ImageChange::Clear,
            None => ImageChange::Keep,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanedPost {
            text: self.text.trim().to_string(),
            group_id,
            image,
        })
    }

    pub fn group_id(&self) -> Option<i32> {
        self.group.as_deref().and_then(|g| g.trim().parse().ok())
    }

    pub fn data(&self, current_image: Option<String>) -> PostFormData {
        PostFormData {
            text: self.text.clone(),
            group: self.group.clone(),
            image: current_image,
        }
    }

    fn from_raw(raw: RawPostFields) -> Self {
        Self {
            text: raw.text,
            group: non_empty(raw.group),
            image: None,
            clear_image: is_checked(raw.image_clear.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPostFields {
    #[serde(default)]
    text: String,
    #[serde(default)]
    group: Option<String>,
    #[serde(default, rename = "image-clear")]
    image_clear: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true" | "1"))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("Failed to read form data: {}", e))
    }
}

/// Accepts `multipart/form-data` (needed for the image) as well as plain
/// urlencoded bodies. Unknown fields are ignored.
impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(raw) = Form::<RawPostFields>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(Self::from_raw(raw));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = field.text().await.map_err(multipart_error)?,
                "group" => form.group = non_empty(Some(field.text().await.map_err(multipart_error)?)),
                "image-clear" => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.clear_image = is_checked(Some(value.as_str()));
                }
                "image" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    let file = UploadedFile {
                        file_name,
                        content_type,
                        data,
                    };
                    if !file.is_absent() {
                        form.image = Some(file);
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}
