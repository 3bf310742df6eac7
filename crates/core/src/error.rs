use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid document url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetching {url} returned {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf had no readable page text: {0}")]
    NoReadableText(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("embedding count {actual} doesn't match input count {expected}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no chunks to index")]
    NoChunks,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding dimension {actual} != {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model api key is not configured")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("language model returned an empty completion")]
    EmptyCompletion,
}

/// Document-level failures. Any of these aborts the whole request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to retrieve or read the document.")]
    Document(#[source] IngestError),

    #[error("Failed to create the vector store for document analysis.")]
    Index(#[source] IndexError),
}
