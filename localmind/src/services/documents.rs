use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::DatabaseBackend;
use crate::error::{LocalMindError, Result};
use crate::models::{Document, DocumentFormat};
use crate::storage::BlobStore;

/// Uploads, listing and removal of documents inside a group.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<dyn DatabaseBackend>,
    blobs: Arc<dyn BlobStore>,
}

impl DocumentService {
    pub fn new(db: Arc<dyn DatabaseBackend>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Store an uploaded file in `group_id`.
    ///
    /// The extension is checked before anything else, so an unsupported file
    /// never reaches the blob store.
    pub async fn upload(&self, group_id: &str, file_name: &str, bytes: &[u8]) -> Result<Document> {
        let format = DocumentFormat::from_file_name(file_name).ok_or_else(|| {
            let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
            LocalMindError::Validation(format!(
                "Unsupported file format: {extension}. Supported: {}",
                DocumentFormat::supported_list()
            ))
        })?;

        if self.db.get_group(group_id).await?.is_none() {
            return Err(LocalMindError::NotFound(format!(
                "Document group {group_id} not found"
            )));
        }

        let id = Uuid::new_v4().to_string();
        let path = self.blobs.store(&id, bytes).await?;

        let document = Document::new(
            id,
            group_id.to_string(),
            Document::display_name(file_name),
            path,
            format,
        );

        if let Err(e) = self.db.create_document(&document).await {
            if let Err(cleanup) = self.blobs.delete(&document.path).await {
                tracing::warn!(document_id = %document.id, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        self.db.touch_group(group_id, Utc::now()).await?;

        tracing::info!(
            document_id = %document.id,
            group_id,
            format = %format,
            size = bytes.len(),
            "Document uploaded"
        );

        Ok(document)
    }

    pub async fn list(&self, group_id: &str) -> Result<Vec<Document>> {
        if self.db.get_group(group_id).await?.is_none() {
            return Err(LocalMindError::NotFound(format!(
                "Document group {group_id} not found"
            )));
        }
        self.db.list_documents_by_group(group_id).await
    }

    pub async fn delete(&self, document_id: &str) -> Result<()> {
        let document = self.db.get_document(document_id).await?.ok_or_else(|| {
            LocalMindError::NotFound(format!("Document {document_id} not found"))
        })?;

        self.remove(&document).await
    }

    /// Drop a document's chunks, its row and its blob, in that order.
    pub(crate) async fn remove(&self, document: &Document) -> Result<()> {
        let chunks = self.db.delete_chunks_by_document(&document.id).await?;
        self.db.delete_document(&document.id).await?;

        match self.blobs.delete(&document.path).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(document_id = %document.id, path = %document.path, "Blob already missing")
            }
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "Failed to delete blob")
            }
        }

        tracing::info!(document_id = %document.id, chunks, "Document deleted");
        Ok(())
    }
}
