mod routes;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use pdf_qa_core::{
    CharacterNgramEmbedder, ChunkingConfig, EmbeddingBackend, GeminiClient, GeminiConfig,
    HttpPdfFetcher, OpenAiEmbedder, OpenAiEmbedderConfig, PipelineOptions, RagCoordinator,
    DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};
use routes::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa-server", version)]
struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PDF_QA_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Gemini API key. Without it the server starts but every model call fails.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model identifier.
    #[arg(long, env = "PDF_QA_GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Base URL of the Generative Language API.
    #[arg(long, env = "PDF_QA_GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    gemini_base_url: String,

    /// OpenAI-compatible embeddings base URL. The local trigram embedder is used when unset.
    #[arg(long, env = "PDF_QA_EMBEDDING_URL")]
    embedding_url: Option<String>,

    /// Embedding model name for the remote embedder.
    #[arg(long, env = "PDF_QA_EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Bearer key for the remote embedder.
    #[arg(long, env = "PDF_QA_EMBEDDING_API_KEY", hide_env_values = true)]
    embedding_api_key: Option<String>,

    /// Vector dimensions: requested from the remote embedder, or used by the local one.
    #[arg(long, env = "PDF_QA_EMBEDDING_DIMENSIONS")]
    embedding_dimensions: Option<usize>,

    /// Max inputs per remote embedding request.
    #[arg(long, env = "PDF_QA_EMBEDDING_BATCH", default_value_t = DEFAULT_EMBEDDING_BATCH_SIZE)]
    embedding_batch_size: usize,

    /// Chunks retrieved per question.
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Target chunk size in characters.
    #[arg(long, default_value_t = 1_200)]
    chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let state = build_state(&cli)?;
    if !state.api_key_configured {
        warn!("GEMINI_API_KEY is not set; language model calls will fail");
    }

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        version = app_version,
        %addr,
        model = state.coordinator.model_name(),
        embeddings = %state.coordinator.embedder_name(),
        started_at = %state.started_at.to_rfc3339(),
        "pdf-qa-server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;

    info!("pdf-qa-server stopped");
    Ok(())
}

fn build_state(cli: &Cli) -> anyhow::Result<AppState> {
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let chunking = ChunkingConfig::new("\n", cli.chunk_size, cli.chunk_overlap)?;
    let options = PipelineOptions {
        chunking,
        top_k: cli.top_k.max(1),
    };

    let embedder = match &cli.embedding_url {
        Some(base_url) => EmbeddingBackend::Remote(OpenAiEmbedder::new(
            http.clone(),
            OpenAiEmbedderConfig {
                base_url: base_url.clone(),
                model: cli.embedding_model.clone(),
                api_key: cli.embedding_api_key.clone(),
                dimensions: cli.embedding_dimensions,
                batch_size: cli.embedding_batch_size,
            },
        )?),
        None => EmbeddingBackend::Local(CharacterNgramEmbedder {
            dimensions: cli
                .embedding_dimensions
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
        }),
    };

    let llm = GeminiClient::new(
        http.clone(),
        GeminiConfig {
            base_url: cli.gemini_base_url.clone(),
            model: cli.gemini_model.clone(),
            api_key: cli.gemini_api_key.clone(),
            ..GeminiConfig::default()
        },
    );
    let api_key_configured = llm.has_api_key();

    let coordinator = RagCoordinator::new(
        Arc::new(HttpPdfFetcher::new(http)),
        Arc::new(embedder),
        Arc::new(llm),
        options,
    );

    Ok(AppState {
        coordinator: Arc::new(coordinator),
        api_key_configured,
        started_at: Utc::now(),
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(error) => {
            warn!(%error, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
