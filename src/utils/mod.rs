pub mod cookie;
pub mod jwt;
pub mod next_url;
pub mod password;

pub use jwt::{auth_config, encode_session_token, init_auth_config};
pub use password::{hash_password, verify_password};
