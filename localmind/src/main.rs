use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use localmind::api::{create_router, AppState};
use localmind::config::Config;
use localmind::db::{Database, DatabaseBackend, LibSqlBackend};
use localmind::embeddings::{EmbeddingProvider, RerankerProvider};
use localmind::llm::ChatClient;
use localmind::migration::{self, MigrationDecision};
use localmind::storage::{BlobStore, LocalBlobStore};

#[derive(Parser)]
#[command(name = "localmind")]
#[command(about = "Self-hostable retrieval-augmented chat backend for local language models")]
struct Args {
    /// Address to bind, overrides LOCALMIND_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides LOCALMIND_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Rebuild the vector index when the embedding dimension changed
    #[arg(long)]
    reindex: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "localmind=info,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database, config.embeddings.dimensions).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db));

    match migration::check_dimension_compatibility(
        &*db,
        config.embeddings.dimensions,
        &config.embeddings.model,
        args.reindex,
    )
    .await?
    {
        MigrationDecision::NotNeeded => {}
        MigrationDecision::Approved => {
            migration::rebuild_vector_index(
                &*db,
                config.embeddings.dimensions,
                &config.embeddings.model,
            )
            .await?;
        }
        MigrationDecision::Rejected { stored, configured } => {
            anyhow::bail!(
                "Embedding dimension mismatch: index has {stored}, EMBEDDING_DIMENSIONS is {configured}. \
                 Restart with --reindex to rebuild the vector index"
            );
        }
    }

    tracing::info!(
        "Using embedding model {} at {}",
        config.embeddings.model,
        config.embeddings.base_url
    );
    let embeddings = EmbeddingProvider::new(&config.embeddings);
    match embeddings.probe().await {
        Ok(dims) if dims == config.embeddings.dimensions => {
            tracing::info!(dimensions = dims, "Embedding server reachable");
        }
        Ok(dims) => {
            tracing::warn!(
                reported = dims,
                configured = config.embeddings.dimensions,
                "Embedding model width differs from EMBEDDING_DIMENSIONS; indexing will fail until they match"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Embedding server probe failed - indexing and retrieval may be degraded");
        }
    }

    let rerank_timeout = Duration::from_secs(config.search.rerank_timeout_secs);
    let reranker = match &config.reranker {
        Some(reranker_config) => {
            tracing::info!("Initializing reranker: {}...", reranker_config.model);
            match RerankerProvider::new_async(reranker_config, rerank_timeout).await {
                Ok(provider) => {
                    tracing::info!("Reranker initialized successfully");
                    provider
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to initialize reranker - continuing without reranking");
                    RerankerProvider::unavailable(e.to_string())
                }
            }
        }
        None => RerankerProvider::unavailable("reranker disabled by configuration"),
    };

    tracing::info!(
        "Using chat model {} at {}",
        config.llm.model,
        config.llm.base_url
    );
    let llm = ChatClient::new(&config.llm)?;

    let blobs: Arc<dyn BlobStore> =
        Arc::new(LocalBlobStore::new(&config.storage.documents_dir).await?);

    let cancel_token = CancellationToken::new();

    let state = AppState::new(config.clone(), db, blobs, embeddings, reranker, llm)
        .with_shutdown(cancel_token.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("LocalMind starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling in-flight answers...");
    cancel_token.cancel();
}
