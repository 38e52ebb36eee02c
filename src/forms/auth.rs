use super::{error, not_blank};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// First path segments owned by the router; a user with one of these names
/// would have an unreachable profile.
pub const RESERVED_USERNAMES: &[&str] = &[
    "new",
    "group",
    "follow",
    "auth",
    "admin",
    "media",
    "about",
    "about-author",
    "about-spec",
    "about-us",
    "terms",
];

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password1: String,
    #[serde(default)]
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
}

/// Values echoed back into the signup template. Passwords are never echoed.
#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct SignupFormData {
    pub username: String,
    pub email: Option<String>,
}

/// Values echoed back into the login template.
#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct LoginFormData {
    pub username: String,
}

impl SignupForm {
    /// Browsers submit an untouched email input as an empty string.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    pub fn data(&self) -> SignupFormData {
        SignupFormData {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

impl LoginForm {
    pub fn data(&self) -> LoginFormData {
        LoginFormData {
            username: self.username.clone(),
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    not_blank(username)?;
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(error(
            "max_length",
            "Ensure this value has at most 150 characters.",
        ));
    }
    let allowed = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !allowed {
        return Err(error(
            "invalid",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(error("reserved", "This username is not available."));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(error("required", super::REQUIRED));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(error(
            "password_too_short",
            "This password is too short. It must contain at least 8 characters.",
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(error(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::field_errors;

    fn signup(username: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: None,
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn usernames() {
        assert!(validate_username("leo.tolstoy+1@x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("new").is_err());
        assert!(validate_username("Admin").is_err());
        assert!(validate_username("about-us").is_err());
        assert!(validate_username("terms").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn mismatched_passwords() {
        let errors = field_errors(
            &signup("leo", "war-and-peace", "anna-karenina")
                .validate()
                .unwrap_err(),
        );
        assert!(errors.contains_key("password2"));
        assert!(!errors.contains_key("password1"));
    }

    #[test]
    fn weak_passwords() {
        assert!(signup("leo", "short1", "short1").validate().is_err());
        assert!(signup("leo", "1234567890", "1234567890").validate().is_err());
        assert!(signup("leo", "long enough", "long enough").validate().is_ok());
    }

    #[test]
    fn empty_email_is_dropped() {
        let form = SignupForm {
            email: Some("  ".to_string()),
            ..signup(" leo ", "long enough", "long enough")
        }
        .normalized();
        assert_eq!(form.username, "leo");
        assert_eq!(form.email, None);
        assert!(form.validate().is_ok());
    }
}
