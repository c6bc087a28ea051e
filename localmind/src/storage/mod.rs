//! Blob storage for uploaded document bytes.

mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalBlobStore;

/// Opaque byte storage keyed by document id.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `id`, returning the stored location.
    async fn store(&self, id: &str, bytes: &[u8]) -> Result<String>;
    /// Location a blob with this id would be stored at.
    fn path_for(&self, id: &str) -> PathBuf;
    async fn exists(&self, path: &str) -> bool;
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    /// Remove a blob. Returns false when nothing was stored there.
    async fn delete(&self, path: &str) -> Result<bool>;
}
