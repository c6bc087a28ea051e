//! v1 API Data Transfer Objects.
//!
//! Wire format for the v1 REST API, kept separate from the domain models in
//! `src/models/`. Field names are camelCase on the wire.

pub mod conversations;
pub mod documents;
pub mod groups;

pub use conversations::*;
pub use documents::*;
pub use groups::*;

use serde::Serialize;

/// Body of every successful `DELETE`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}
