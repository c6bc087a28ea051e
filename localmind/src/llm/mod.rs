mod api;
pub mod prompts;

pub use api::{ChatClient, ChatMessage, ChatRole, TokenStream, UNREACHABLE_MESSAGE};
