use text_splitter::{ChunkConfig, TextSplitter};

use crate::config::ProcessingConfig;

/// A piece of extracted text sized for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub char_count: usize,
}

/// Trait for content chunking implementations
pub trait ContentChunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Recursive semantic splitter measured in characters.
///
/// Splits on the largest boundary that fits (paragraphs, lines, sentences,
/// words, graphemes, characters) and overlaps neighbours by up to `chunk_overlap`.
pub struct RecursiveChunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    pub fn new(config: &ProcessingConfig) -> Self {
        Self::with_sizes(config.chunk_size, config.chunk_overlap)
    }

    pub fn with_sizes(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = if chunk_overlap >= chunk_size {
            tracing::warn!(
                chunk_size,
                chunk_overlap,
                "Chunk overlap must be smaller than chunk size, clamping"
            );
            chunk_size - 1
        } else {
            chunk_overlap
        };

        let splitter = match ChunkConfig::new(chunk_size).with_overlap(chunk_overlap) {
            Ok(config) => TextSplitter::new(config),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid chunk overlap, splitting without overlap");
                TextSplitter::new(ChunkConfig::new(chunk_size))
            }
        };

        Self {
            splitter,
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl ContentChunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.splitter
            .chunks(text)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| TextChunk {
                content: chunk.to_string(),
                char_count: chunk.chars().count(),
            })
            .collect()
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::with_sizes(500, 150)
    }
}
