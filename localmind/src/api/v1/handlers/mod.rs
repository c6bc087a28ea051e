pub mod chat;
pub mod conversations;
pub mod documents;
pub mod groups;
pub(crate) mod health;

pub use health::health_check;
