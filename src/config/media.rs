use super::parse_bool_env;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploaded images are written to.
    pub root: PathBuf,
    /// Public URL prefix, always with leading and trailing slash.
    pub url: String,
    /// Serve `root` under `url` from this process (development setups).
    pub serve: bool,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
        let url = env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());
        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self::new(root, &url, parse_bool_env("SERVE_MEDIA", !production))
    }

    pub fn new(root: impl Into<PathBuf>, url: &str, serve: bool) -> Self {
        Self {
            root: root.into(),
            url: normalize_url_prefix(url),
            serve,
        }
    }

    /// URL for a stored relative media path such as `posts/ab12.png`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.url, path.trim_start_matches('/'))
    }
}

fn normalize_url_prefix(url: &str) -> String {
    let trimmed = url.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_prefix_gets_slashes() {
        assert_eq!(normalize_url_prefix("media"), "/media/");
        assert_eq!(normalize_url_prefix("/media/"), "/media/");
        assert_eq!(normalize_url_prefix(""), "/");
    }

    #[test]
    fn url_for_joins_relative_path() {
        let config = MediaConfig::new("/tmp/m", "/media", true);
        assert_eq!(config.url_for("posts/a.png"), "/media/posts/a.png");
    }
}
