use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DocumentFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub group_id: String,
    /// Display name, the uploaded file name up to its first dot.
    pub name: String,
    /// Location of the blob in the blob store.
    pub path: String,
    pub format: DocumentFormat,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: String,
        group_id: String,
        name: String,
        path: String,
        format: DocumentFormat,
    ) -> Self {
        Self {
            id,
            group_id,
            name,
            path,
            format,
            uploaded_at: Utc::now(),
        }
    }

    /// Display name for an uploaded file: everything before the first `.`.
    pub fn display_name(file_name: &str) -> String {
        let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
        base.split('.').next().unwrap_or(base).to_string()
    }
}
