//! Instruction templates and prompt assembly for chat exchanges.
//!
//! Each conversation type has one fixed instruction template. Retrieved chunks,
//! when any, are appended to the same system message as a context block.

use crate::models::{ConversationType, RetrievalResult};

use super::api::{ChatMessage, ChatRole};

pub const GENERAL_INSTRUCTIONS: &str = r#"You are a helpful and honest AI assistant.

**Instructions:**
1. Answer the user's question based *only* on your pre-trained knowledge.
2. **CRITICAL:** If you do not know the answer or if the question is outside your knowledge base, explicitly state: "I don't have enough information to answer that accurately."
3. Do not make up names, dates, or facts to fill in gaps.
4. Do not refer to any external "context" or "documents" as none are provided."#;

pub const RAG_INSTRUCTIONS: &str = r#"You are a helpful and intelligent AI assistant.

**Instructions:**
1. You have access to a specific "Context" provided below. Use it as your primary source of information.
2. However, you are NOT limited to this context. You should combine the context with your own general knowledge to provide a comprehensive, well-rounded answer.
3. If the context mentions specific terms, explain them clearly using the text provided.
4. If the context is missing details, feel free to make reasonable inferences or provide general advice related to the topic."#;

pub const STRICT_RAG_INSTRUCTIONS: &str = r#"You are a STRICT Information and intelligent AI assistant

**CRITICAL RULES:**
1. Your ONLY source of truth is the "Context" text provided below.
2. DO NOT use outside knowledge, common sense, or pre-training data. If it is not in the text, it does not exist.
3. If the user asks a question that is NOT answered word-for-word in the context, you MUST output EXACTLY: "I cannot answer this based on the provided context."
4. Do not offer to help further. Do not apologize. Do not hallucinate."#;

/// The fixed refusal the strict template demands when the context is insufficient.
pub const STRICT_RAG_REFUSAL: &str = "I cannot answer this based on the provided context.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub fn instructions_for(conv_type: ConversationType) -> &'static str {
    match conv_type {
        ConversationType::General => GENERAL_INSTRUCTIONS,
        ConversationType::Rag => RAG_INSTRUCTIONS,
        ConversationType::StrictRag => STRICT_RAG_INSTRUCTIONS,
    }
}

/// Render retrieved chunks as `Source: {source}\n{content}` blocks.
///
/// Returns an empty string when nothing was retrieved.
pub fn build_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|r| format!("Source: {}\n{}", r.metadata.source, r.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn system_message(conv_type: ConversationType, context: &str) -> String {
    let mut message = format!("Instruction:\n{}", instructions_for(conv_type));
    if !context.is_empty() {
        message.push_str("\n\nContext:\n");
        message.push_str(context);
    }
    message
}

/// Combine the system message, prior history and the new user turn.
///
/// A leading system entry in `history` is replaced. The user text is appended
/// unless the history already ends with that exact user turn.
pub fn assemble_messages(
    system: String,
    mut history: Vec<ChatMessage>,
    user_text: &str,
) -> Vec<ChatMessage> {
    match history.first_mut() {
        Some(first) if first.role == ChatRole::System => first.content = system,
        _ => history.insert(0, ChatMessage::new(ChatRole::System, system)),
    }

    let already_last = history
        .last()
        .is_some_and(|m| m.role == ChatRole::User && m.content == user_text);
    if !already_last {
        history.push(ChatMessage::new(ChatRole::User, user_text));
    }

    history
}
