pub mod dto;
pub mod handlers;
pub mod openapi;
pub mod response;
pub mod router;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::routes::create_router;
    use crate::api::state::AppState;
    use crate::config::{Config, DatabaseConfig, LlmConfig};
    use crate::db::{Database, DatabaseBackend, LibSqlBackend};
    use crate::embeddings::{EmbeddingProvider, RerankerProvider};
    use crate::llm::ChatClient;
    use crate::storage::{BlobStore, LocalBlobStore};

    const BOUNDARY: &str = "localmind-test-boundary";

    /// State with no reachable model servers; the tempdir must outlive it.
    async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig::file(dir.path().join("api.db"));
        config.embeddings.dimensions = 3;
        config.reranker = None;
        config.llm = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..config.llm
        };

        let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(
            Database::new(&config.database, 3).await.unwrap(),
        ));
        let blobs: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(dir.path().join("blobs")).await.unwrap());
        let embeddings = EmbeddingProvider::unavailable("not started in tests", 3);
        let reranker = RerankerProvider::unavailable("disabled in tests");
        let llm = ChatClient::new(&config.llm).unwrap();

        let state = AppState::new(config, db, blobs, embeddings, reranker, llm);
        (state, dir)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(group_id: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/groups/{group_id}/documents"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_group(state: &AppState, name: &str) -> String {
        let response = create_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/v1/groups",
                serde_json::json!({ "name": name }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn health_reports_components() {
        let (state, _dir) = test_state().await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json.get("error").is_none());
        assert_eq!(json["data"]["database"]["status"], "ok");
        assert_eq!(json["data"]["embeddings"]["status"], "unavailable");
        assert_eq!(json["data"]["llm"]["model"], "llama3.1");
        assert_eq!(json["data"]["reranker"]["status"], "disabled");
    }

    #[tokio::test]
    async fn openapi_json_is_valid() {
        let (state, _dir) = test_state().await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let version = json["openapi"]
            .as_str()
            .expect("openapi field should be a string");
        assert!(version.starts_with('3'));
        assert!(json["paths"]
            .get("/api/v1/conversations/{conversationId}/messages")
            .is_some());
    }

    #[tokio::test]
    async fn create_group_returns_201_with_fresh_group() {
        let (state, _dir) = test_state().await;
        let group_id = create_group(&state, "Manuals").await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/groups/{group_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "Manuals");
        assert!(json["data"]["lastTrained"].is_null());
        assert_eq!(json["data"]["isStale"], true);
    }

    #[tokio::test]
    async fn empty_group_name_is_invalid_request() {
        let (state, _dir) = test_state().await;

        let response = create_router(state)
            .oneshot(json_request(
                "POST",
                "/api/v1/groups",
                serde_json::json!({ "name": "" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn missing_field_is_invalid_request() {
        let (state, _dir) = test_state().await;

        let response = create_router(state)
            .oneshot(json_request(
                "POST",
                "/api/v1/conversations",
                serde_json::json!({ "convType": "rag" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Missing required field: title");
    }

    #[tokio::test]
    async fn unknown_group_is_not_found_envelope() {
        let (state, _dir) = test_state().await;

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/groups/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "not_found");
        assert!(json["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn csv_upload_is_rejected_before_storage() {
        let (state, dir) = test_state().await;
        let group_id = create_group(&state, "Sheets").await;

        let response = create_router(state.clone())
            .oneshot(upload_request(&group_id, "prices.csv", "a,b\n1,2\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "Unsupported file format: csv. Supported: pdf, txt, doc, docx"
        );

        assert!(state.documents.list(&group_id).await.unwrap().is_empty());
        let stored = std::fs::read_dir(dir.path().join("blobs")).unwrap().count();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn txt_upload_returns_201_and_lists() {
        let (state, _dir) = test_state().await;
        let group_id = create_group(&state, "Notes").await;

        let response = create_router(state.clone())
            .oneshot(upload_request(&group_id, "pump.notes.txt", "check the valve"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["name"], "pump");
        assert_eq!(json["data"]["format"], "txt");
        assert_eq!(json["data"]["groupId"], group_id.as_str());

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/groups/{group_id}/documents"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_model_returns_503_before_streaming() {
        let (state, _dir) = test_state().await;

        let response = create_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/v1/conversations",
                serde_json::json!({ "title": "Offline" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let conversation_id = body_json(response).await["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = create_router(state)
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/conversations/{conversation_id}/messages"),
                serde_json::json!({ "text": "hello?" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "backend_unreachable");
        assert_eq!(json["error"]["message"], crate::llm::UNREACHABLE_MESSAGE);
    }
}
