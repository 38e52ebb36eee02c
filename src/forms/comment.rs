use super::not_blank;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Comment submission. Post and author are taken from the URL and the
/// session, never from the body.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}
