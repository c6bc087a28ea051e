use std::sync::Arc;

use crate::db::DatabaseBackend;
use crate::error::{LocalMindError, Result};
use crate::models::ChunkRecord;

use super::TextChunk;

/// Writes one document's chunk vectors into the vector store.
pub struct IndexWriter {
    db: Arc<dyn DatabaseBackend>,
}

impl IndexWriter {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Upsert `chunks` with their `embeddings` as `{document_id}_{ordinal}`.
    ///
    /// Re-indexing replaces the previous entries, so the document ends up with
    /// exactly `chunks.len()` chunks. Nothing is written on a length mismatch.
    pub async fn upsert(
        &self,
        document_id: &str,
        source_name: &str,
        chunks: &[TextChunk],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(LocalMindError::IndexMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(ordinal, (chunk, embedding))| ChunkRecord {
                id: ChunkRecord::chunk_id(document_id, ordinal),
                document_id: document_id.to_string(),
                ordinal,
                content: chunk.content.clone(),
                source: source_name.to_string(),
                embedding,
            })
            .collect();

        let written = self.db.upsert_chunks(document_id, &records).await?;

        tracing::debug!(document_id, chunks = written, "Indexed document chunks");

        Ok(written)
    }
}
