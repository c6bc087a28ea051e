use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::error::{LocalMindError, Result};
use crate::models::{Document, TrainSummary};
use crate::storage::BlobStore;

use super::{ContentChunker, ContentExtractor, IndexWriter, RecursiveChunker};

/// Why a document was left out of an indexing run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingBlob,
    EmptyText,
    NoChunks,
    /// Chunk ordinals whose embedding request failed.
    EmbeddingFailed { failed: Vec<usize> },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Indexed { chunks: usize },
    Skipped(SkipReason),
}

impl DocumentOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, DocumentOutcome::Indexed { .. })
    }
}

/// Extract, chunk, embed and index every document of a group.
///
/// Documents are isolated from each other: any failure skips that document
/// and the run continues with the next one.
pub struct IndexingPipeline {
    db: Arc<dyn DatabaseBackend>,
    blobs: Arc<dyn BlobStore>,
    embeddings: EmbeddingProvider,
    chunker: Arc<dyn ContentChunker>,
    writer: IndexWriter,
    concurrency: usize,
}

impl IndexingPipeline {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        blobs: Arc<dyn BlobStore>,
        embeddings: EmbeddingProvider,
        config: &Config,
    ) -> Self {
        Self {
            writer: IndexWriter::new(db.clone()),
            db,
            blobs,
            concurrency: config.embeddings.concurrency.max(1),
            embeddings,
            chunker: Arc::new(RecursiveChunker::new(&config.processing)),
        }
    }

    pub fn with_chunker(mut self, chunker: Arc<dyn ContentChunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Index all documents in `group_id`. Leaves `last_trained` untouched.
    pub async fn train(&self, group_id: &str) -> Result<TrainSummary> {
        let documents = self.db.list_documents_by_group(group_id).await?;
        let total_count = documents.len();

        if documents.is_empty() {
            tracing::info!(group_id, "No documents to index");
            return Ok(TrainSummary {
                processed_count: 0,
                total_count: 0,
            });
        }

        tracing::info!(group_id, documents = total_count, "Indexing group");

        let mut processed_count = 0;
        for document in &documents {
            let outcome = match self.index_document(document).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(document_id = %document.id, error = %e, "Failed to index document");
                    DocumentOutcome::Skipped(SkipReason::Failed(e.to_string()))
                }
            };

            match &outcome {
                DocumentOutcome::Indexed { chunks } => {
                    processed_count += 1;
                    tracing::info!(document_id = %document.id, chunks, "Document indexed");
                }
                DocumentOutcome::Skipped(reason) => {
                    tracing::warn!(document_id = %document.id, reason = ?reason, "Document skipped");
                }
            }
        }

        tracing::info!(group_id, processed_count, total_count, "Group indexing finished");

        Ok(TrainSummary {
            processed_count,
            total_count,
        })
    }

    pub async fn index_document(&self, document: &Document) -> Result<DocumentOutcome> {
        if !self.blobs.exists(&document.path).await {
            return Ok(DocumentOutcome::Skipped(SkipReason::MissingBlob));
        }

        let bytes = self.blobs.read(&document.path).await?;
        let format = document.format;
        let text = tokio::task::spawn_blocking(move || ContentExtractor::extract(&bytes, format))
            .await
            .map_err(|e| LocalMindError::Processing(format!("Extraction task failed: {e}")))?;

        if text.trim().is_empty() {
            return Ok(DocumentOutcome::Skipped(SkipReason::EmptyText));
        }

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Ok(DocumentOutcome::Skipped(SkipReason::NoChunks));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let results = self.embeddings.embed_many(&texts, self.concurrency).await;

        let mut embeddings = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (ordinal, result) in results.into_iter().enumerate() {
            match result {
                Ok(embedding) => embeddings.push(embedding),
                Err(e) => {
                    tracing::warn!(
                        document_id = %document.id,
                        ordinal,
                        error = %e,
                        "Chunk embedding failed"
                    );
                    failed.push(ordinal);
                }
            }
        }

        if !failed.is_empty() {
            return Ok(DocumentOutcome::Skipped(SkipReason::EmbeddingFailed {
                failed,
            }));
        }

        let written = self
            .writer
            .upsert(&document.id, &document.name, &chunks, embeddings)
            .await?;

        Ok(DocumentOutcome::Indexed { chunks: written })
    }
}
