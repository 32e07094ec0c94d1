//! Blob storage for uploaded files (resumes, portfolio images).

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Where a stored blob can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    pub path: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<StoredBlob>;
}

/// Keeps only characters that are safe in a single path segment.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return Err(Error::invalid_input("File name is empty"));
    }
    Ok(cleaned)
}

/// Stores blobs on the local filesystem under `root`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<StoredBlob> {
        let name = sanitize_file_name(path)?;
        let stored = format!("{}-{name}", uuid::Uuid::new_v4());

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored), bytes).await?;
        debug!(file = %stored, size = bytes.len(), "Stored upload");

        Ok(StoredBlob {
            url: format!("{}/uploads/{stored}", self.public_base_url),
            path: stored,
        })
    }
}
