mod api;
mod provider;
mod reranker;


pub use provider::EmbeddingProvider;
pub use reranker::{RerankResult, RerankerProvider};
