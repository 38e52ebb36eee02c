//! Form schemas for user submissions.
//!
//! Each form is a `validator` derive struct; `field_errors` turns the
//! resulting `ValidationErrors` into the field-scoped messages a template
//! shows next to each input.

pub mod auth;
pub mod comment;
pub mod post;
pub mod upload;

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

pub use auth::{LoginForm, SignupForm};
pub use comment::CommentForm;
pub use post::{CleanedPost, ImageChange, PostForm};
pub use upload::UploadedFile;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name → messages. Form-wide errors live under `__all__`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "__all__";

pub fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Required text: whitespace-only input counts as missing.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("required", REQUIRED));
    }
    Ok(())
}

/// A form as handed to a template: the submitted values plus any errors.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoundForm<T> {
    pub data: T,
    pub errors: FieldErrors,
}

impl<T> BoundForm<T> {
    pub fn unbound(data: T) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(data: T, errors: FieldErrors) -> Self {
        Self { data, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(custom(function = "not_blank"))]
        text: String,
    }

    #[test]
    fn blank_text_reports_required() {
        let sample = Sample {
            text: "   ".to_string(),
        };
        let errors = field_errors(&sample.validate().unwrap_err());
        assert_eq!(errors["text"], vec![REQUIRED.to_string()]);
    }

    #[test]
    fn add_error_appends_to_field() {
        let mut errors = FieldErrors::new();
        add_error(&mut errors, "group", INVALID_CHOICE);
        add_error(&mut errors, "group", "again");
        assert_eq!(errors["group"].len(), 2);
    }
}
