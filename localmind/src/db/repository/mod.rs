mod chunks;
mod conversations;
mod documents;
mod groups;
mod messages;

pub use chunks::ChunkRepository;
pub use conversations::ConversationRepository;
pub use documents::DocumentRepository;
pub use groups::GroupRepository;
pub use messages::MessageRepository;

use chrono::{DateTime, Utc};

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// `?{start}, ?{start+1}, ...` for `count` positional parameters.
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> (tempfile::TempDir, libsql::Connection) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = libsql::Builder::new_local(path).build().await.unwrap();
    let conn = db.connect().unwrap();
    crate::db::schema::init_schema(&conn, 3).await.unwrap();
    (dir, conn)
}
