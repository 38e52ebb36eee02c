use super::parse_env;
use std::time::Duration;

/// Feed pages are cached this long unless `PAGE_CACHE_TTL_SECS` says otherwise.
pub const DEFAULT_PAGE_CACHE_TTL_SECS: u64 = 20;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub page_ttl: Duration,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            page_ttl: Duration::from_secs(parse_env(
                "PAGE_CACHE_TTL_SECS",
                DEFAULT_PAGE_CACHE_TTL_SECS,
            )),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_ttl: Duration::from_secs(DEFAULT_PAGE_CACHE_TTL_SECS),
        }
    }
}
