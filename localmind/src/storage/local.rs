use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::BlobStore;
use crate::error::{LocalMindError, Result};

/// Stores each blob as a file named after its id, without an extension.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            LocalMindError::Internal(format!(
                "Failed to create documents directory {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, id: &str, bytes: &[u8]) -> Result<String> {
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
            return Err(LocalMindError::Validation(format!("Invalid blob id: {id}")));
        }

        let path = self.path_for(id);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored blob");

        Ok(path.to_string_lossy().into_owned())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(LocalMindError::NotFound(format!("Blob not found: {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
