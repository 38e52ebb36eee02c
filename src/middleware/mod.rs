pub mod auth;
pub mod error_page;
pub mod security;

pub use auth::{auth_middleware, login_required, require_admin, AuthUser};
pub use error_page::{error_page_middleware, panic_page};
pub use security::security_headers_middleware;
