use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{LocalMindError, Result};

pub const UNREACHABLE_MESSAGE: &str =
    "Cannot connect to Ollama. Make sure Ollama is running: Run 'ollama serve' in terminal";

/// Content fragments from a streaming chat completion, in arrival order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

/// What a single NDJSON line from `/api/chat` contributes to the stream.
#[derive(Debug, PartialEq)]
enum LineEvent {
    Token(String),
    /// Final line; may still carry trailing content.
    Done(Option<String>),
    /// The server reported a failure in-band.
    Error(String),
    Skip,
}

fn parse_line(line: &[u8]) -> LineEvent {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Skip;
    }

    match serde_json::from_str::<StreamLine>(line) {
        Ok(parsed) => {
            if let Some(error) = parsed.error {
                return LineEvent::Error(error);
            }
            if parsed.done {
                return LineEvent::Done(
                    parsed.message.map(|m| m.content).filter(|c| !c.is_empty()),
                );
            }
            match parsed.message {
                Some(m) if !m.content.is_empty() => LineEvent::Token(m.content),
                _ => LineEvent::Skip,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Skipping undecodable stream line");
            LineEvent::Skip
        }
    }
}

/// Streaming client for the Ollama `/api/chat` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LocalMindError::Llm(format!("Failed to create LLM HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a streaming completion. Connection and status failures are reported
    /// here, before any token; failures after that arrive as `LlmStream` items.
    pub async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    tracing::error!(url = %url, error = %e, "Language model server unreachable");
                    LocalMindError::LlmUnreachable(UNREACHABLE_MESSAGE.to_string())
                } else if e.is_timeout() {
                    LocalMindError::Timeout(format!("Chat request timed out: {e}"))
                } else {
                    LocalMindError::Llm(format!("Chat request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LocalMindError::Llm(format!(
                "Language model returned {status}: {body}"
            )));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(LocalMindError::LlmStream(format!("Stream interrupted: {e}")));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match parse_line(&line) {
                        LineEvent::Token(token) => yield Ok(token),
                        LineEvent::Done(tail) => {
                            if let Some(token) = tail {
                                yield Ok(token);
                            }
                            return;
                        }
                        LineEvent::Error(message) => {
                            yield Err(LocalMindError::LlmStream(message));
                            return;
                        }
                        LineEvent::Skip => {}
                    }
                }
            }

            // Unterminated final line
            match parse_line(&buffer) {
                LineEvent::Done(tail) => {
                    if let Some(token) = tail {
                        yield Ok(token);
                    }
                }
                LineEvent::Error(message) => {
                    yield Err(LocalMindError::LlmStream(message));
                }
                LineEvent::Token(token) => {
                    yield Ok(token);
                    yield Err(LocalMindError::LlmStream(
                        "stream ended before completion".to_string(),
                    ));
                }
                LineEvent::Skip => {
                    yield Err(LocalMindError::LlmStream(
                        "stream ended before completion".to_string(),
                    ));
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
