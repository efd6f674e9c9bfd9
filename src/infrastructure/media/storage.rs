use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;

use crate::shared::error::AppError;

const MAX_NAME_LEN: usize = 100;

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist `data` and return its public reference.
    async fn store(&self, file_name: &str, data: &[u8]) -> Result<String, AppError>;

    /// Delete a file previously returned by [`MediaStorage::store`].
    async fn remove(&self, media_ref: &str) -> Result<(), AppError>;
}

/// Writes uploads to a local directory served under `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// `<millis>-<random>-<sanitized name>`
    fn stored_name(file_name: &str) -> String {
        format!(
            "{}-{:08x}-{}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>(),
            sanitize_file_name(file_name)
        )
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, file_name: &str, data: &[u8]) -> Result<String, AppError> {
        fs::create_dir_all(&self.base_path).await?;

        let name = Self::stored_name(file_name);
        fs::write(self.base_path.join(&name), data).await?;

        Ok(format!("{}/{}", self.public_prefix, name))
    }

    async fn remove(&self, media_ref: &str) -> Result<(), AppError> {
        let name = media_ref
            .strip_prefix(&self.public_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && sanitize_file_name(name) == *name)
            .ok_or_else(|| AppError::BadRequest(format!("Not a stored media reference: {}", media_ref)))?;

        fs::remove_file(self.base_path.join(name)).await?;
        Ok(())
    }
}

/// Reduce a client-supplied file name to a safe single path segment.
///
/// Directory components are dropped and anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
