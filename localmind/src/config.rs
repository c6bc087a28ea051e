use serde::Deserialize;
use std::env;

/// Default base URL of the local Ollama server, used for both chat and embeddings.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Comma-separated list, empty entries dropped.
fn parse_env_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub embeddings: EmbeddingsConfig,
    pub processing: ProcessingConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub reranker: Option<RerankerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    /// Replica file for a remote `url`.
    pub local_path: Option<String>,
    /// SQLite `busy_timeout` for local files.
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl DatabaseConfig {
    /// A local database file with default pragmas.
    pub fn file(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            url: format!("file:{}", path.as_ref().display()),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
        }
    }
}

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// SQLite journal mode applied to local database files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    /// Lets readers continue while an answer or an index batch is being written.
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

impl std::str::FromStr for JournalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DELETE" => Ok(Self::Delete),
            "TRUNCATE" => Ok(Self::Truncate),
            "PERSIST" => Ok(Self::Persist),
            "MEMORY" => Ok(Self::Memory),
            "WAL" => Ok(Self::Wal),
            "OFF" => Ok(Self::Off),
            other => Err(format!("unknown journal mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub documents_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Maximum embedding requests in flight while indexing a document.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub n_results: usize,
    /// Candidates fetched from the vector store per requested result.
    pub overfetch_factor: usize,
    pub vector_timeout_secs: u64,
    pub rerank_timeout_secs: u64,
}

/// Chat model configuration. The server speaks the Ollama `/api/chat` protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Reranker configuration for improving search result ordering
#[derive(Debug, Clone, Deserialize)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub model: String,
    pub cache_dir: String,
    pub batch_size: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "bge-reranker-base".to_string(),
            cache_dir: ".fastembed_cache".to_string(),
            batch_size: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ollama_url =
            env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());

        Self {
            server: ServerConfig {
                host: env::var("LOCALMIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("LOCALMIND_PORT", 8000),
                cors_origins: parse_env_list("CORS_ORIGINS"),
                max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:localmind.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS),
                journal_mode: parse_env_or("DATABASE_JOURNAL_MODE", JournalMode::Wal),
            },
            storage: StorageConfig {
                documents_dir: env::var("DOCUMENTS_DIR")
                    .unwrap_or_else(|_| "./storage/documents".to_string()),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "bge-m3".to_string()),
                base_url: env::var("EMBEDDING_BASE_URL").unwrap_or_else(|_| ollama_url.clone()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 1024),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", 60),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", 2),
                concurrency: parse_env_or("EMBEDDING_CONCURRENCY", 25),
            },
            processing: ProcessingConfig {
                chunk_size: parse_env_or("CHUNK_SIZE", 500),
                chunk_overlap: parse_env_or("CHUNK_OVERLAP", 150),
            },
            search: SearchConfig {
                n_results: parse_env_or("SEARCH_N_RESULTS", 5),
                overfetch_factor: parse_env_or("SEARCH_OVERFETCH_FACTOR", 3),
                vector_timeout_secs: parse_env_or("SEARCH_VECTOR_TIMEOUT", 10),
                rerank_timeout_secs: parse_env_or("SEARCH_RERANK_TIMEOUT", 30),
            },
            llm: LlmConfig {
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3.1".to_string()),
                base_url: ollama_url,
                timeout_secs: parse_env_or("LLM_TIMEOUT", 300),
                connect_timeout_secs: parse_env_or("LLM_CONNECT_TIMEOUT", 10),
                temperature: parse_env_or("LLM_TEMPERATURE", 0.7),
                max_tokens: parse_env_or("LLM_MAX_TOKENS", 2000),
            },
            reranker: {
                let enabled = parse_env_or("RERANK_ENABLED", true);

                if enabled {
                    Some(RerankerConfig {
                        enabled,
                        model: env::var("RERANK_MODEL")
                            .unwrap_or_else(|_| "bge-reranker-base".to_string()),
                        cache_dir: env::var("RERANK_CACHE_DIR")
                            .unwrap_or_else(|_| ".fastembed_cache".to_string()),
                        batch_size: parse_env_or("RERANK_BATCH_SIZE", 64),
                    })
                } else {
                    None
                }
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let config = Self::default();
        config.warn_on_inconsistencies();
        config
    }

    fn warn_on_inconsistencies(&self) {
        if self.processing.chunk_overlap >= self.processing.chunk_size {
            tracing::warn!(
                chunk_size = self.processing.chunk_size,
                chunk_overlap = self.processing.chunk_overlap,
                "CHUNK_OVERLAP must be smaller than CHUNK_SIZE; overlap will be clamped"
            );
        }
        if self.embeddings.timeout_secs >= self.llm.timeout_secs {
            tracing::warn!(
                embedding_timeout = self.embeddings.timeout_secs,
                llm_timeout = self.llm.timeout_secs,
                "Embedding timeout is not shorter than the generation timeout"
            );
        }
    }
}
