use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};

/// `REDIS_URL` is optional: `None` means the page cache stays in-process.
pub fn redis_url() -> Option<String> {
    std::env::var("REDIS_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

pub async fn get_redis(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(redis_url)?;

    let manager = timeout(Duration::from_secs(5), ConnectionManager::new(client))
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 5 seconds"))??;

    Ok(manager)
}
