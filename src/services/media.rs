use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use sha2::{Digest, Sha256};
use tokio::fs;

/// Content-addressed storage for uploaded images under the media root.
#[derive(Clone)]
pub struct MediaStorage {
    config: MediaConfig,
}

impl MediaStorage {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        self.config.url_for(path)
    }

    /// Store `data` as `<subdirectory>/<sha256>.<ext>` and return that
    /// relative path. Identical uploads share one file.
    pub async fn save(&self, subdirectory: &str, data: &[u8], ext: &str) -> AppResult<String> {
        let relative = content_path(subdirectory, data, ext);
        let dir = self.config.root.join(subdirectory);

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to create media directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let file_path = self.config.root.join(&relative);
        if fs::try_exists(&file_path).await.unwrap_or(false) {
            tracing::debug!("Media file {} already stored", relative);
            return Ok(relative);
        }

        fs::write(&file_path, data).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write media file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        tracing::info!("Stored media file {} ({} bytes)", relative, data.len());
        Ok(relative)
    }
}

fn content_path(subdirectory: &str, data: &[u8], ext: &str) -> String {
    let digest = Sha256::digest(data);
    format!("{}/{:x}.{}", subdirectory, digest, ext)
}
