use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use localmind::error::LocalMindError;
use localmind::llm::prompts::STRICT_RAG_REFUSAL;
use localmind::models::{ConversationType, MessageSender};
use localmind::services::ExchangeState;

mod common;
use common::{chat_requests, harness, mount_chat};

// =============================================================================
// Streaming and finalization
// =============================================================================

#[tokio::test]
async fn test_stream_forwards_tokens_and_finalizes_once() {
    let h = harness().await;
    mount_chat(&h.chat_server, &["Hello", ", ", "world"]).await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Greeting", ConversationType::General, &[])
        .await
        .unwrap();

    let exchange = h
        .state
        .chat
        .start_exchange(&conversation.id, "Hi there")
        .await
        .unwrap();
    let state = exchange.state.clone();
    assert_eq!(*state.borrow(), ExchangeState::Created);

    let tokens: Vec<String> = exchange
        .tokens
        .map(|t| t.expect("token"))
        .collect()
        .await;

    assert_eq!(tokens, vec!["Hello", ", ", "world"]);
    assert_eq!(*state.borrow(), ExchangeState::Finalized);

    let messages = h.state.conversations.messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, exchange.user_message_id);
    assert_eq!(messages[0].sender, MessageSender::User);
    assert_eq!(messages[0].text, "Hi there");
    assert_eq!(messages[1].id, exchange.assistant_message_id);
    assert_eq!(messages[1].sender, MessageSender::Assistant);
    assert_eq!(messages[1].text, "Hello, world");
}

#[tokio::test]
async fn test_general_mode_sends_history_without_retrieval() {
    let h = harness().await;
    mount_chat(&h.chat_server, &["Sure."]).await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Follow-up", ConversationType::General, &[])
        .await
        .unwrap();

    for text in ["First question", "Second question"] {
        let exchange = h
            .state
            .chat
            .start_exchange(&conversation.id, text)
            .await
            .unwrap();
        let _: Vec<_> = exchange.tokens.collect().await;
    }

    let requests = chat_requests(&h.chat_server).await;
    assert_eq!(requests.len(), 2);

    let second = &requests[1];
    assert_eq!(second["stream"], true);
    assert_eq!(second["model"], "llama3.1");
    let roles: Vec<&str> = second["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(second["messages"][2]["content"], "Sure.");
    assert_eq!(second["messages"][3]["content"], "Second question");

    let system = second["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with("Instruction:\n"));
    assert!(!system.contains("Context:"));

    // General conversations never embed the query
    let embedding_calls = h
        .embedding_server
        .received_requests()
        .await
        .unwrap_or_default()
        .len();
    assert_eq!(embedding_calls, 0);
}

// =============================================================================
// Retrieval scope
// =============================================================================

#[tokio::test]
async fn test_strict_rag_uses_only_linked_group_context() {
    let h = harness().await;
    mount_chat(&h.chat_server, &[STRICT_RAG_REFUSAL]).await;

    let manuals = h.state.groups.create("Manuals").await.unwrap();
    let finance = h.state.groups.create("Finance").await.unwrap();
    h.state
        .documents
        .upload(&manuals.id, "pump.txt", b"The pump pressure must stay at 40 psi.")
        .await
        .unwrap();
    h.state
        .documents
        .upload(&finance.id, "budget.txt", b"The secret budget is one million.")
        .await
        .unwrap();
    assert_eq!(h.state.groups.train(&manuals.id).await.unwrap().summary.processed_count, 1);
    assert_eq!(h.state.groups.train(&finance.id).await.unwrap().summary.processed_count, 1);

    let (conversation, _) = h
        .state
        .conversations
        .create(
            "Maintenance",
            ConversationType::StrictRag,
            &[manuals.id.clone()],
        )
        .await
        .unwrap();

    let exchange = h
        .state
        .chat
        .start_exchange(&conversation.id, "What is the pump pressure and the budget?")
        .await
        .unwrap();
    let answer: String = exchange
        .tokens
        .map(|t| t.unwrap())
        .collect::<Vec<_>>()
        .await
        .concat();
    assert_eq!(answer, STRICT_RAG_REFUSAL);

    let requests = chat_requests(&h.chat_server).await;
    let system = requests[0]["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains(STRICT_RAG_REFUSAL));
    assert!(system.contains("Context:\nSource: pump\nThe pump pressure must stay at 40 psi."));
    assert!(!system.contains("secret budget"));
}

// =============================================================================
// Failures and cancellation
// =============================================================================

#[tokio::test]
async fn test_upstream_error_status_fails_before_streaming() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&h.chat_server)
        .await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Broken", ConversationType::General, &[])
        .await
        .unwrap();

    let err = h
        .state
        .chat
        .start_exchange(&conversation.id, "Anyone there?")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LocalMindError::Llm(ref m) if m.contains("500")));

    let messages = h.state.conversations.messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender, MessageSender::Assistant);
    assert_eq!(messages[1].text, "");
}

async fn mount_raw_chat(h: &common::Harness, body: String) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&h.chat_server)
        .await;
}

/// Runs one exchange against a raw upstream body and returns what the caller saw.
async fn run_truncated_exchange(
    body: String,
) -> (Vec<Result<String, LocalMindError>>, ExchangeState, String) {
    let h = harness().await;
    mount_raw_chat(&h, body).await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Truncated", ConversationType::General, &[])
        .await
        .unwrap();
    let exchange = h
        .state
        .chat
        .start_exchange(&conversation.id, "What is the answer?")
        .await
        .unwrap();
    let state = exchange.state.clone();
    let items: Vec<_> = exchange.tokens.collect().await;
    let final_state = *state.borrow();

    let messages = h.state.conversations.messages(&conversation.id).await.unwrap();
    (items, final_state, messages[1].text.clone())
}

#[tokio::test]
async fn test_in_band_model_error_discards_partial_answer() {
    let body = format!(
        "{}\n{}\n",
        json!({ "message": { "role": "assistant", "content": "The answer is" }, "done": false }),
        json!({ "error": "model runner has unexpectedly stopped" })
    );

    let (items, state, saved) = run_truncated_exchange(body).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "The answer is");
    assert!(matches!(items[1], Err(LocalMindError::LlmStream(_))));
    assert_eq!(state, ExchangeState::Failed);
    assert_eq!(saved, "");
}

#[tokio::test]
async fn test_stream_ending_without_done_discards_partial_answer() {
    let body = format!(
        "{}\n",
        json!({ "message": { "role": "assistant", "content": "The answer is" }, "done": false })
    );

    let (items, state, saved) = run_truncated_exchange(body).await;

    assert!(matches!(items.last(), Some(Err(LocalMindError::LlmStream(_)))));
    assert_eq!(state, ExchangeState::Failed);
    assert_eq!(saved, "");
}

#[tokio::test]
async fn test_unknown_conversation_and_empty_text() {
    let h = harness().await;

    let err = h
        .state
        .chat
        .start_exchange("missing", "hello")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LocalMindError::NotFound(_)));

    let (conversation, _) = h
        .state
        .conversations
        .create("Quiet", ConversationType::General, &[])
        .await
        .unwrap();
    let err = h
        .state
        .chat
        .start_exchange(&conversation.id, "   ")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LocalMindError::Validation(_)));
    assert!(h
        .state
        .conversations
        .messages(&conversation.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_cancelled_exchange_writes_nothing() {
    let h = harness().await;
    mount_chat(&h.chat_server, &["never", "seen"]).await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Cancelled", ConversationType::General, &[])
        .await
        .unwrap();

    let exchange = h
        .state
        .chat
        .start_exchange(&conversation.id, "Tell me a story")
        .await
        .unwrap();
    let state = exchange.state.clone();
    exchange.cancel.cancel();

    let tokens: Vec<_> = exchange.tokens.collect().await;
    assert!(tokens.is_empty());
    assert_eq!(*state.borrow(), ExchangeState::Failed);

    let messages = h.state.conversations.messages(&conversation.id).await.unwrap();
    assert_eq!(messages[1].text, "");
}

#[tokio::test]
async fn test_dropped_stream_marks_exchange_failed() {
    let h = harness().await;
    mount_chat(&h.chat_server, &["partial"]).await;

    let (conversation, _) = h
        .state
        .conversations
        .create("Dropped", ConversationType::General, &[])
        .await
        .unwrap();

    let exchange = h
        .state
        .chat
        .start_exchange(&conversation.id, "Hello")
        .await
        .unwrap();
    let state = exchange.state.clone();
    drop(exchange.tokens);

    assert_eq!(*state.borrow(), ExchangeState::Failed);
    let messages = h.state.conversations.messages(&conversation.id).await.unwrap();
    assert_eq!(messages[1].text, "");
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_exchanges() {
    let h = harness().await;
    mount_chat(&h.chat_server, &["late"]).await;

    let shutdown = CancellationToken::new();
    let state = h.state.clone().with_shutdown(shutdown.clone());

    let (conversation, _) = state
        .conversations
        .create("Shutdown", ConversationType::General, &[])
        .await
        .unwrap();
    let exchange = state
        .chat
        .start_exchange(&conversation.id, "Still there?")
        .await
        .unwrap();
    let watch = exchange.state.clone();

    shutdown.cancel();
    let tokens: Vec<_> = exchange.tokens.collect().await;

    assert!(tokens.is_empty());
    assert_eq!(*watch.borrow(), ExchangeState::Failed);
}
