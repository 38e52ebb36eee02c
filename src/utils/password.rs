use crate::utils::jwt::auth_config;
use anyhow::{Context, Result};

/// Hash a password with bcrypt at the configured cost.
pub fn hash_password(password: &str) -> Result<String> {
    let cost = auth_config()?.bcrypt_cost;
    bcrypt::hash(password, cost).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
