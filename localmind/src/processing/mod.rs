mod chunker;
mod docx;
mod extractor;
mod indexer;
mod pipeline;

pub use chunker::{ContentChunker, RecursiveChunker, TextChunk};
pub use docx::DocxExtractor;
pub use extractor::ContentExtractor;
pub use indexer::IndexWriter;
pub use pipeline::{DocumentOutcome, IndexingPipeline, SkipReason};
