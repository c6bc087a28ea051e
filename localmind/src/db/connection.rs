use std::sync::Arc;

use libsql::{Builder, Connection};

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Where `DatabaseConfig::url` points.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Location<'a> {
    Remote { url: &'a str },
    Replica { url: &'a str, path: &'a str },
    Memory,
    File(&'a str),
}

impl<'a> Location<'a> {
    fn of(config: &'a DatabaseConfig) -> Self {
        let url = config.url.as_str();
        if url.starts_with("libsql://") || url.starts_with("https://") {
            match config.local_path.as_deref() {
                Some(path) => Self::Replica { url, path },
                None => Self::Remote { url },
            }
        } else if url == ":memory:" {
            Self::Memory
        } else {
            Self::File(url.strip_prefix("file:").unwrap_or(url))
        }
    }
}

/// Handle to the libsql database holding groups, documents, conversations and
/// the chunk vectors. The chunk table is created with a fixed vector width.
#[derive(Clone)]
pub struct Database {
    pub(crate) db: Arc<libsql::Database>,
    pub(crate) embedding_dimensions: usize,
}

impl Database {
    pub async fn new(config: &DatabaseConfig, embedding_dimensions: usize) -> Result<Self> {
        let location = Location::of(config);
        let token = config.auth_token.clone().unwrap_or_default();

        let db = match location {
            Location::Remote { url } => Builder::new_remote(url.to_string(), token).build().await?,
            Location::Replica { url, path } => {
                Builder::new_remote_replica(path, url.to_string(), token)
                    .build()
                    .await?
            }
            Location::Memory => Builder::new_local(":memory:").build().await?,
            Location::File(path) => Builder::new_local(path).build().await?,
        };

        let database = Self {
            db: Arc::new(db),
            embedding_dimensions,
        };

        // Pragmas only mean something for a file this process owns
        if matches!(location, Location::File(_)) {
            database.apply_pragmas(config).await?;
        }

        let conn = database.connect()?;
        schema::init_schema(&conn, embedding_dimensions).await?;

        tracing::debug!(url = %config.url, embedding_dimensions, "Database ready");
        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    async fn apply_pragmas(&self, config: &DatabaseConfig) -> Result<()> {
        let conn = self.connect()?;
        let pragmas = [
            format!("PRAGMA busy_timeout = {}", config.busy_timeout_ms),
            format!("PRAGMA journal_mode = {}", config.journal_mode.as_str()),
        ];

        for pragma in &pragmas {
            if let Err(error) = conn.execute_batch(pragma).await {
                tracing::warn!(pragma = %pragma, error = %error, "Failed to apply SQLite pragma");
            }
        }
        Ok(())
    }

    /// Width of the vector column the chunk table was created with.
    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    pub async fn sync(&self) -> Result<()> {
        if let Ok(sync) = self.db.sync().await {
            tracing::info!("Database synced: {:?}", sync);
        }
        Ok(())
    }
}
