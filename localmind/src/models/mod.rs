mod chunk;
mod common;
mod conversation;
mod document;
mod group;

pub use chunk::*;
pub use common::*;
pub use conversation::*;
pub use document::*;
pub use group::*;
