use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentGroup {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever a document is uploaded into the group.
    pub updated_at: DateTime<Utc>,
    pub last_trained: Option<DateTime<Utc>>,
}

impl DocumentGroup {
    pub fn new(id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            created_at: now,
            updated_at: now,
            last_trained: None,
        }
    }

    /// True when the vector index may not reflect the group's current documents.
    pub fn is_stale(&self) -> bool {
        match self.last_trained {
            None => true,
            Some(trained) => self.updated_at > trained,
        }
    }
}

/// Counts reported by one indexing run over a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub processed_count: usize,
    pub total_count: usize,
}
