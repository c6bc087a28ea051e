use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::DatabaseBackend;
use crate::error::{LocalMindError, Result};
use crate::llm::prompts::{assemble_messages, build_context, system_message};
use crate::llm::{ChatClient, ChatMessage, ChatRole, TokenStream};
use crate::models::{Conversation, Message, MessageSender};

use super::RetrievalEngine;

/// Lifecycle of one streamed question/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Both messages persisted, upstream not yet read.
    Created,
    Streaming,
    /// The full answer was written to the assistant message.
    Finalized,
    /// Generation failed or was cancelled; the assistant message stays empty.
    Failed,
}

/// A started exchange. Message ids are known before the first token.
pub struct ChatExchange {
    pub user_message_id: String,
    pub assistant_message_id: String,
    pub tokens: TokenStream,
    pub state: watch::Receiver<ExchangeState>,
    pub cancel: CancellationToken,
}

/// Marks the exchange failed if the stream is dropped before it settles.
struct StateGuard {
    tx: watch::Sender<ExchangeState>,
    settled: bool,
}

impl StateGuard {
    fn set(&mut self, state: ExchangeState) {
        if matches!(state, ExchangeState::Finalized | ExchangeState::Failed) {
            self.settled = true;
        }
        self.tx.send_replace(state);
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.tx.send_replace(ExchangeState::Failed);
        }
    }
}

enum Step {
    Cancelled,
    Next(Option<Result<String>>),
}

#[derive(Clone)]
pub struct ChatService {
    db: Arc<dyn DatabaseBackend>,
    retrieval: RetrievalEngine,
    client: ChatClient,
    n_results: usize,
    shutdown: CancellationToken,
}

impl ChatService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        retrieval: RetrievalEngine,
        client: ChatClient,
        n_results: usize,
    ) -> Self {
        Self {
            db,
            retrieval,
            client,
            n_results,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel every in-flight exchange when `token` fires.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Persist the user turn and an empty assistant placeholder, then open the
    /// model stream.
    ///
    /// Upstream connection and status failures are returned here, before any
    /// token. The placeholder is written exactly once, when the returned stream
    /// completes; an error, cancellation or dropped stream leaves it empty.
    pub async fn start_exchange(&self, conversation_id: &str, text: &str) -> Result<ChatExchange> {
        if text.trim().is_empty() {
            return Err(LocalMindError::Validation(
                "Message text cannot be empty".to_string(),
            ));
        }

        let conversation = self
            .db
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                LocalMindError::NotFound(format!("Conversation {conversation_id} not found"))
            })?;

        let user_message = Message::new(
            Uuid::new_v4().to_string(),
            conversation_id.to_string(),
            text.to_string(),
            MessageSender::User,
        );
        self.db.create_message(&user_message).await?;

        let assistant_message = Message::new(
            Uuid::new_v4().to_string(),
            conversation_id.to_string(),
            String::new(),
            MessageSender::Assistant,
        );
        self.db.create_message(&assistant_message).await?;
        self.db.touch_conversation(conversation_id, Utc::now()).await?;

        let (state_tx, state_rx) = watch::channel(ExchangeState::Created);
        let mut guard = StateGuard {
            tx: state_tx,
            settled: false,
        };

        let messages = self
            .build_messages(&conversation, &assistant_message.id, text)
            .await?;

        let upstream = match self.client.stream_chat(&messages).await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "Failed to open model stream");
                guard.set(ExchangeState::Failed);
                return Err(e);
            }
        };

        let cancel = self.shutdown.child_token();
        let tokens = Self::relay(
            self.db.clone(),
            assistant_message.id.clone(),
            upstream,
            cancel.clone(),
            guard,
        );

        Ok(ChatExchange {
            user_message_id: user_message.id,
            assistant_message_id: assistant_message.id,
            tokens,
            state: state_rx,
            cancel,
        })
    }

    /// History (without the placeholder), retrieval context and instructions.
    async fn build_messages(
        &self,
        conversation: &Conversation,
        placeholder_id: &str,
        text: &str,
    ) -> Result<Vec<ChatMessage>> {
        let history: Vec<ChatMessage> = self
            .db
            .list_messages(&conversation.id)
            .await?
            .into_iter()
            .filter(|m| m.id != placeholder_id)
            .map(|m| {
                let role = match m.sender {
                    MessageSender::User => ChatRole::User,
                    MessageSender::Assistant => ChatRole::Assistant,
                };
                ChatMessage::new(role, m.text)
            })
            .collect();

        let context = if conversation.conv_type.uses_retrieval() {
            let results = self
                .retrieval
                .search(text, &conversation.id, self.n_results)
                .await;
            tracing::info!(
                conversation_id = %conversation.id,
                chunks = results.len(),
                "Retrieved context"
            );
            build_context(&results)
        } else {
            String::new()
        };

        let system = system_message(conversation.conv_type, &context);
        Ok(assemble_messages(system, history, text))
    }

    /// Forward upstream tokens while accumulating the answer; write it once at
    /// the end of a clean stream.
    fn relay(
        db: Arc<dyn DatabaseBackend>,
        assistant_message_id: String,
        mut upstream: TokenStream,
        cancel: CancellationToken,
        mut guard: StateGuard,
    ) -> TokenStream {
        let stream = async_stream::stream! {
            guard.set(ExchangeState::Streaming);
            let mut answer = String::new();

            loop {
                let step = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Step::Cancelled,
                    next = upstream.next() => Step::Next(next),
                };

                match step {
                    Step::Cancelled => {
                        tracing::info!(
                            message_id = %assistant_message_id,
                            "Exchange cancelled, answer discarded"
                        );
                        guard.set(ExchangeState::Failed);
                        return;
                    }
                    Step::Next(Some(Ok(token))) => {
                        answer.push_str(&token);
                        yield Ok(token);
                    }
                    Step::Next(Some(Err(e))) => {
                        tracing::error!(
                            message_id = %assistant_message_id,
                            error = %e,
                            "Model stream failed, answer discarded"
                        );
                        guard.set(ExchangeState::Failed);
                        yield Err(e);
                        return;
                    }
                    Step::Next(None) => break,
                }
            }

            match db.update_message_text(&assistant_message_id, &answer).await {
                Ok(_) => {
                    tracing::info!(
                        message_id = %assistant_message_id,
                        chars = answer.chars().count(),
                        "Answer finalized"
                    );
                    guard.set(ExchangeState::Finalized);
                }
                Err(e) => {
                    tracing::error!(message_id = %assistant_message_id, error = %e, "Failed to save answer");
                    guard.set(ExchangeState::Failed);
                    yield Err(e);
                }
            }
        };

        Box::pin(stream)
    }
}
