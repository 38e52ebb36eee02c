use super::{parse_bool_env, parse_env};
use anyhow::Result;
use std::env;

/// Two weeks, the usual lifetime of a browser session.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub session_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let bcrypt_cost = parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(anyhow::anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        Ok(Self {
            secret,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            bcrypt_cost,
            cookie_secure: parse_bool_env("AUTH_COOKIE_SECURE", false),
        })
    }
}
