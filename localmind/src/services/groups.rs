use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::DatabaseBackend;
use crate::error::{LocalMindError, Result};
use crate::models::{DocumentGroup, TrainSummary};
use crate::processing::IndexingPipeline;

use super::DocumentService;

/// Result of a `train` call on a group.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub summary: TrainSummary,
    pub last_trained: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct GroupService {
    db: Arc<dyn DatabaseBackend>,
    documents: DocumentService,
    pipeline: Arc<IndexingPipeline>,
}

impl GroupService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        documents: DocumentService,
        pipeline: Arc<IndexingPipeline>,
    ) -> Self {
        Self {
            db,
            documents,
            pipeline,
        }
    }

    pub async fn create(&self, name: &str) -> Result<DocumentGroup> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LocalMindError::Validation(
                "Group name cannot be empty".to_string(),
            ));
        }

        let group = DocumentGroup::new(Uuid::new_v4().to_string(), name.to_string());
        self.db.create_group(&group).await?;

        tracing::info!(group_id = %group.id, name, "Document group created");
        Ok(group)
    }

    pub async fn list(&self) -> Result<Vec<DocumentGroup>> {
        self.db.list_groups().await
    }

    pub async fn get(&self, group_id: &str) -> Result<DocumentGroup> {
        self.db
            .get_group(group_id)
            .await?
            .ok_or_else(|| LocalMindError::NotFound(format!("Document group {group_id} not found")))
    }

    /// Delete a group with its documents, their chunks and blobs, and its
    /// conversation links.
    pub async fn delete(&self, group_id: &str) -> Result<()> {
        self.get(group_id).await?;

        let documents = self.db.list_documents_by_group(group_id).await?;
        for document in &documents {
            self.documents.remove(document).await?;
        }

        self.db.unlink_group_from_conversations(group_id).await?;
        self.db.delete_group(group_id).await?;

        tracing::info!(group_id, documents = documents.len(), "Document group deleted");
        Ok(())
    }

    /// Index every document of the group, then record the training time.
    ///
    /// The stamp is the start of the run: an upload that lands while the
    /// pipeline is working leaves the group stale.
    pub async fn train(&self, group_id: &str) -> Result<TrainOutcome> {
        self.get(group_id).await?;

        let started = Utc::now();
        let summary = self.pipeline.train(group_id).await?;
        self.db.mark_group_trained(group_id, started).await?;

        let last_trained = self.get(group_id).await?.last_trained;

        Ok(TrainOutcome {
            summary,
            last_trained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{ConversationStore, DocumentStore};
    use crate::embeddings::EmbeddingProvider;
    use crate::models::{Conversation, ConversationType};
    use crate::services::test_support::stores;

    async fn service(dir: &tempfile::TempDir) -> (GroupService, DocumentService, Arc<dyn DatabaseBackend>) {
        let (db, blobs) = stores(dir).await;
        let documents = DocumentService::new(db.clone(), blobs.clone());
        let pipeline = IndexingPipeline::new(
            db.clone(),
            blobs,
            EmbeddingProvider::unavailable("not configured", 3),
            &Config::default(),
        );
        (
            GroupService::new(db.clone(), documents.clone(), Arc::new(pipeline)),
            documents,
            db,
        )
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let (groups, _, _) = service(&dir).await;

        assert!(matches!(
            groups.create("   ").await,
            Err(LocalMindError::Validation(_))
        ));
        let group = groups.create("  Manuals ").await.unwrap();
        assert_eq!(group.name, "Manuals");
        assert!(group.is_stale());
    }

    #[tokio::test]
    async fn test_train_bumps_last_trained_even_when_nothing_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let (groups, _, _) = service(&dir).await;
        let group = groups.create("Manuals").await.unwrap();

        let outcome = groups.train(&group.id).await.unwrap();

        assert_eq!(outcome.summary.total_count, 0);
        assert!(outcome.last_trained.is_some());
        assert!(!groups.get(&group.id).await.unwrap().is_stale());
    }

    #[tokio::test]
    async fn test_train_unknown_group() {
        let dir = tempfile::tempdir().unwrap();
        let (groups, _, _) = service(&dir).await;

        assert!(matches!(
            groups.train("missing").await,
            Err(LocalMindError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_documents_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let (groups, documents, db) = service(&dir).await;
        let group = groups.create("Manuals").await.unwrap();
        let doc = documents.upload(&group.id, "a.txt", b"alpha").await.unwrap();

        db.create_conversation(&Conversation::new(
            "c1".to_string(),
            "Chat".to_string(),
            ConversationType::Rag,
        ))
        .await
        .unwrap();
        db.link_conversation_group("c1", &group.id).await.unwrap();

        groups.delete(&group.id).await.unwrap();

        assert!(db.get_document(&doc.id).await.unwrap().is_none());
        assert!(!std::path::Path::new(&doc.path).exists());
        assert!(db.conversation_group_ids("c1").await.unwrap().is_empty());
        assert!(matches!(
            groups.get(&group.id).await,
            Err(LocalMindError::NotFound(_))
        ));
    }
}
