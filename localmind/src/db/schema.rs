use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection, embedding_dimensions: usize) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Document groups: the unit of indexing and of conversation scope
        CREATE TABLE IF NOT EXISTS document_groups (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_trained TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_document_groups_updated_at ON document_groups(updated_at);

        -- Uploaded documents; blobs live in the blob store under `path`
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            format TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            FOREIGN KEY (group_id) REFERENCES document_groups(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_documents_group_id ON documents(group_id);

        -- Conversations and the groups they may retrieve from
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            conv_type TEXT NOT NULL DEFAULT 'general',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversation_groups (
            conversation_id TEXT NOT NULL,
            group_id TEXT NOT NULL,
            added_at TEXT NOT NULL,
            PRIMARY KEY (conversation_id, group_id),
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
            FOREIGN KEY (group_id) REFERENCES document_groups(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_conversation_groups_group_id ON conversation_groups(group_id);

        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            text TEXT NOT NULL,
            sender TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
            ON messages(conversation_id, created_at);

        -- Key/value bookkeeping (embedding dimensions)
        CREATE TABLE IF NOT EXISTS localmind_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .await?;

    create_chunk_table(conn, embedding_dimensions).await?;

    Ok(())
}

/// Drop every indexed chunk and recreate the chunk table for a new vector width.
pub async fn rebuild_chunk_table(conn: &Connection, embedding_dimensions: usize) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP INDEX IF EXISTS chunks_embedding_idx;
        DROP TABLE IF EXISTS chunks;
        "#,
    )
    .await?;

    create_chunk_table(conn, embedding_dimensions).await
}

async fn create_chunk_table(conn: &Connection, embedding_dimensions: usize) -> Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            ordinal INTEGER NOT NULL,
            content TEXT NOT NULL,
            source TEXT NOT NULL,
            embedding F32_BLOB({embedding_dimensions}) NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON chunks(document_id);
        "#
    ))
    .await?;

    create_vector_index(conn).await
}

async fn create_vector_index(conn: &Connection) -> Result<()> {
    let index_exists: bool = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type='index' AND name='chunks_embedding_idx'",
            (),
        )
        .await?
        .next()
        .await?
        .is_some();

    if !index_exists {
        if let Err(e) = conn
            .execute(
                "CREATE INDEX IF NOT EXISTS chunks_embedding_idx ON chunks(libsql_vector_idx(embedding, 'metric=cosine'))",
                (),
            )
            .await
        {
            tracing::warn!("Vector index creation failed for chunks (may already exist): {e}");
        }
    }

    Ok(())
}
