//! LocalMind: retrieval-augmented chat over local document groups, backed by
//! an Ollama-compatible model server and a libsql vector index.

pub mod api;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod migration;
pub mod models;
pub mod processing;
pub mod services;
pub mod storage;
