use crate::config::auth::AuthConfig;
use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static AUTH_CONFIG: OnceLock<AuthConfig> = OnceLock::new();

/// Install the auth config. Must be called once at startup; later calls
/// keep the first value.
pub fn init_auth_config(config: AuthConfig) -> Result<()> {
    AUTH_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Auth config already initialized"))?;
    Ok(())
}

pub fn auth_config() -> Result<&'static AuthConfig> {
    AUTH_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Auth config not initialized, call init_auth_config() at startup"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

pub fn encode_session_token(user_id: i32) -> Result<String> {
    let config = auth_config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + config.session_ttl_secs as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))
}

pub fn decode_session_token(token: &str) -> Result<Claims> {
    let config = auth_config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode session token: {}", e))
}

#[cfg(test)]
pub(crate) fn ensure_test_config() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = init_auth_config(AuthConfig {
            secret: "a_very_long_secret_key_that_is_at_least_32_chars".to_string(),
            session_ttl_secs: 3600,
            bcrypt_cost: 4,
            cookie_secure: false,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        ensure_test_config();
        let token = encode_session_token(42).unwrap();
        let claims = decode_session_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_fails() {
        ensure_test_config();
        let token = encode_session_token(42).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_session_token(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_test_config();
        let config = auth_config().unwrap();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_session_token(&token).is_err());
    }

    #[test]
    fn non_numeric_subject_has_no_user() {
        let claims = Claims {
            sub: "abc".to_string(),
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.user_id(), None);
    }
}
