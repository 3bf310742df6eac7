use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use pdf_qa_core::{PipelineError, RagCoordinator};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "PDF QA - Document Question Answering";

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RagCoordinator>,
    pub api_key_configured: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub documents: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub documents: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: String,
    pub document_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/hackrx/run", post(run_handler))
        .route("/api/quick-summary", post(quick_summary_handler))
        .route("/api/health", get(health))
        .route("/api/supported-formats", get(supported_formats))
        .with_state(state)
}

pub async fn run_handler(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    let span = info_span!("analyze", request_id = %Uuid::new_v4(), documents = %request.documents);
    async move {
        info!(questions = request.questions.len(), "received document analysis request");
        let started = Instant::now();
        let coordinator = Arc::clone(&state.coordinator);
        let RunRequest {
            documents,
            questions,
        } = request;

        let answers = run_isolated(async move { coordinator.run(&documents, &questions).await })
            .await
            .map_err(|failure| failure.into_api_error("Internal server error: "))?;

        info!(
            answers = answers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request processed"
        );
        Ok(Json(answers))
    }
    .instrument(span)
    .await
}

pub async fn quick_summary_handler(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let span = info_span!("summary", request_id = %Uuid::new_v4(), documents = %request.documents);
    async move {
        let coordinator = Arc::clone(&state.coordinator);
        let documents = request.documents.clone();

        let summary = run_isolated(async move { coordinator.summarize(&documents).await })
            .await
            .map_err(|failure| failure.into_api_error(""))?;

        Ok(Json(SummaryResponse {
            success: true,
            summary,
            document_url: request.documents,
        }))
    }
    .instrument(span)
    .await
}

enum Failure {
    Pipeline(PipelineError),
    Unexpected(String),
}

impl Failure {
    fn into_api_error(self, internal_prefix: &str) -> ApiError {
        match self {
            Self::Pipeline(error) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    detail: error.to_string(),
                }),
            ),
            Self::Unexpected(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: format!("{internal_prefix}{message}"),
                }),
            ),
        }
    }
}

/// Runs one pipeline on its own task so a panic becomes a 500 instead of a
/// dropped connection.
async fn run_isolated<T, F>(pipeline: F) -> Result<T, Failure>
where
    T: Send + 'static,
    F: Future<Output = Result<T, PipelineError>> + Send + 'static,
{
    match tokio::spawn(pipeline.in_current_span()).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            info!(%error, "document could not be processed");
            Err(Failure::Pipeline(error))
        }
        Err(join_error) => {
            error!(error = %join_error, "pipeline task failed");
            Err(Failure::Unexpected(join_error.to_string()))
        }
    }
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "ai_model": state.coordinator.model_name(),
        "features": ["PDF Analysis", "AI Q&A", "Vector Search", "Batch Processing"],
        "main_endpoint": "/hackrx/run",
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let options = state.coordinator.options();
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "capabilities": {
            "pdf_processing": true,
            "ai_analysis": true,
            "vector_search": true,
            "batch_questions": true,
        },
        "ai_models": {
            "language_model": state.coordinator.model_name(),
            "embeddings": state.coordinator.embedder_name(),
            "vector_store": "in-memory cosine similarity",
        },
        "retrieval": {
            "top_k": options.top_k,
            "chunk_size": options.chunking.chunk_size,
            "chunk_overlap": options.chunking.chunk_overlap,
        },
        "environment": {
            "api_key_configured": state.api_key_configured,
            "started_at": state.started_at.to_rfc3339(),
            "uptime_seconds": (Utc::now() - state.started_at).num_seconds().max(0),
        },
    }))
}

pub async fn supported_formats() -> Json<Value> {
    Json(json!({
        "supported_formats": ["PDF"],
        "processing_capabilities": {
            "text_extraction": "Page-by-page text extraction",
            "large_documents": "Handles documents with 100+ pages",
            "multilingual": "Any language present in the PDF text layer",
        },
        "limitations": {
            "image_only_pdfs": "Scanned PDFs without a text layer are rejected",
            "password_protected": "Password-protected PDFs are not supported",
        },
    }))
}
