use crate::db::traits::DatabaseBackend;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDecision {
    NotNeeded,
    Approved,
    Rejected { stored: usize, configured: usize },
}

/// Compare the configured embedding width with the one the vector index was built for.
///
/// A fresh database records the configured width. A mismatch is only approved when
/// `force_rebuild` is set, since rebuilding discards every indexed chunk.
pub async fn check_dimension_compatibility(
    db: &dyn DatabaseBackend,
    configured_dimensions: usize,
    embedding_model: &str,
    force_rebuild: bool,
) -> Result<MigrationDecision> {
    let stored_dimensions = db.get_embedding_dimensions().await?;

    match stored_dimensions {
        None => {
            tracing::info!(
                "Fresh database, storing embedding dimensions: {}",
                configured_dimensions
            );
            db.set_embedding_dimensions(configured_dimensions).await?;
            db.set_embedding_model(embedding_model).await?;
            Ok(MigrationDecision::NotNeeded)
        }
        Some(stored) if stored == configured_dimensions => {
            if let Some(previous_model) = db.get_embedding_model().await? {
                if previous_model != embedding_model {
                    tracing::warn!(
                        previous = %previous_model,
                        current = %embedding_model,
                        "Embedding model changed with the same dimensions; retrain groups for consistent results"
                    );
                }
            }
            tracing::info!("Embedding dimensions match: {}", configured_dimensions);
            Ok(MigrationDecision::NotNeeded)
        }
        Some(stored) => {
            tracing::warn!(
                "Dimension mismatch: vector index has {} dimensions, configuration expects {}",
                stored,
                configured_dimensions
            );

            if force_rebuild {
                tracing::info!("Reindex flag set, proceeding with vector index rebuild");
                Ok(MigrationDecision::Approved)
            } else {
                Ok(MigrationDecision::Rejected {
                    stored,
                    configured: configured_dimensions,
                })
            }
        }
    }
}

/// Recreate the vector index at the new width and mark every group stale.
pub async fn rebuild_vector_index(
    db: &dyn DatabaseBackend,
    new_dimensions: usize,
    embedding_model: &str,
) -> Result<()> {
    tracing::info!("Rebuilding vector index at {} dimensions", new_dimensions);

    db.rebuild_vector_index(new_dimensions).await?;
    let cleared = db.clear_all_trained().await?;
    db.set_embedding_dimensions(new_dimensions).await?;
    db.set_embedding_model(embedding_model).await?;

    tracing::info!(
        groups = cleared,
        "Vector index rebuilt; retrain groups to repopulate it"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{Database, GroupStore, LibSqlBackend, MetadataStore};
    use crate::models::DocumentGroup;
    use chrono::Utc;

    async fn backend(dir: &tempfile::TempDir, dims: usize) -> LibSqlBackend {
        let config = DatabaseConfig::file(dir.path().join("meta.db"));
        LibSqlBackend::new(Database::new(&config, dims).await.unwrap())
    }

    #[tokio::test]
    async fn test_fresh_database_records_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 4).await;

        let decision = check_dimension_compatibility(&db, 4, "bge-m3", false)
            .await
            .unwrap();
        assert_eq!(decision, MigrationDecision::NotNeeded);
        assert_eq!(db.get_embedding_dimensions().await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_mismatch_requires_flag_and_rebuild_marks_groups_stale() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 4).await;
        check_dimension_compatibility(&db, 4, "bge-m3", false)
            .await
            .unwrap();

        let group = DocumentGroup::new("g1".to_string(), "Manuals".to_string());
        db.create_group(&group).await.unwrap();
        db.mark_group_trained("g1", Utc::now()).await.unwrap();

        let decision = check_dimension_compatibility(&db, 8, "nomic-embed-text", false)
            .await
            .unwrap();
        assert_eq!(
            decision,
            MigrationDecision::Rejected {
                stored: 4,
                configured: 8
            }
        );

        let decision = check_dimension_compatibility(&db, 8, "nomic-embed-text", true)
            .await
            .unwrap();
        assert_eq!(decision, MigrationDecision::Approved);

        rebuild_vector_index(&db, 8, "nomic-embed-text").await.unwrap();
        assert_eq!(db.get_embedding_dimensions().await.unwrap(), Some(8));
        assert!(db.get_group("g1").await.unwrap().unwrap().is_stale());
    }
}
