// Shared harness for integration tests: a file-backed database, a blob
// directory and mock embedding and chat servers.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use localmind::api::AppState;
use localmind::config::{Config, DatabaseConfig};
use localmind::db::{Database, DatabaseBackend, LibSqlBackend};
use localmind::embeddings::{EmbeddingProvider, RerankerProvider};
use localmind::llm::ChatClient;
use localmind::storage::{BlobStore, LocalBlobStore};

pub use tempfile;
pub use wiremock;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub struct Harness {
    pub state: AppState,
    pub embedding_server: MockServer,
    pub chat_server: MockServer,
    _dir: tempfile::TempDir,
}

/// Texts mentioning "pump" embed to one axis, everything else to another.
pub fn topic_embedding(req: &Request) -> ResponseTemplate {
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
    let prompt = body["prompt"].as_str().unwrap_or_default().to_lowercase();
    let embedding = if prompt.contains("pump") {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    ResponseTemplate::new(200).set_body_json(json!({ "embedding": embedding }))
}

pub async fn harness() -> Harness {
    init_test_logger();

    let dir = tempfile::tempdir().unwrap();
    let embedding_server = MockServer::start().await;
    let chat_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(topic_embedding)
        .mount(&embedding_server)
        .await;

    let mut config = Config::default();
    config.database = DatabaseConfig::file(dir.path().join("localmind.db"));
    config.storage.documents_dir = dir.path().join("documents").display().to_string();
    config.embeddings.base_url = embedding_server.uri();
    config.embeddings.dimensions = 3;
    config.embeddings.max_retries = 0;
    config.llm.base_url = chat_server.uri();
    config.reranker = None;

    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(
        Database::new(&config.database, 3).await.unwrap(),
    ));
    let blobs: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(&config.storage.documents_dir)
            .await
            .unwrap(),
    );
    let embeddings = EmbeddingProvider::new(&config.embeddings);
    let reranker = RerankerProvider::unavailable("disabled in tests");
    let llm = ChatClient::new(&config.llm).unwrap();

    let state = AppState::new(config, db, blobs, embeddings, reranker, llm);

    Harness {
        state,
        embedding_server,
        chat_server,
        _dir: dir,
    }
}

/// NDJSON body the way Ollama streams `/api/chat`.
pub fn ndjson(tokens: &[&str]) -> String {
    let mut body = String::new();
    for token in tokens {
        body.push_str(
            &json!({ "message": { "role": "assistant", "content": token }, "done": false })
                .to_string(),
        );
        body.push('\n');
    }
    body.push_str(&json!({ "message": { "role": "assistant", "content": "" }, "done": true }).to_string());
    body.push('\n');
    body
}

pub async fn mount_chat(server: &MockServer, tokens: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(ndjson(tokens), "application/x-ndjson"),
        )
        .mount(server)
        .await;
}

/// Bodies of every `/api/chat` request the mock received, oldest first.
pub async fn chat_requests(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/api/chat")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}
