use serde::{Deserialize, Serialize};

/// Metadata stored alongside every indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChunkMetadata {
    pub document_id: String,
    /// Display name of the source document.
    pub source: String,
}

/// A chunk as written to the vector store.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub document_id: String,
    pub ordinal: usize,
    pub content: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Stable chunk id, so re-indexing a document overwrites its previous chunks.
    pub fn chunk_id(document_id: &str, ordinal: usize) -> String {
        format!("{document_id}_{ordinal}")
    }
}

/// A chunk returned by a vector similarity query.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

/// A retrieved chunk handed to the chat orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RetrievalResult {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Cross-encoder relevance, absent when results are in vector order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<ChunkCandidate> for RetrievalResult {
    fn from(candidate: ChunkCandidate) -> Self {
        Self {
            id: candidate.id,
            content: candidate.content,
            metadata: candidate.metadata,
            score: None,
        }
    }
}
