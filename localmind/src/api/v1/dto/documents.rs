//! Document response DTOs. Uploads arrive as multipart forms, so there is no
//! request body type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{self, DocumentFormat};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub group_id: String,
    /// File name up to its first dot.
    pub name: String,
    pub format: DocumentFormat,
    pub uploaded_at: DateTime<Utc>,
}

impl From<models::Document> for DocumentResponse {
    fn from(doc: models::Document) -> Self {
        Self {
            id: doc.id,
            group_id: doc.group_id,
            name: doc.name,
            format: doc.format,
            uploaded_at: doc.uploaded_at,
        }
    }
}
