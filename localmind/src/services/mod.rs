mod chat;
mod conversations;
mod documents;
mod groups;
mod search;

pub use chat::{ChatExchange, ChatService, ExchangeState};
pub use conversations::ConversationService;
pub use documents::DocumentService;
pub use groups::{GroupService, TrainOutcome};
pub use search::{AccessScopeResolver, RetrievalEngine};
