pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod index;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod retriever;
pub mod rewrite;
pub mod synthesize;
pub mod traits;

pub use chunking::{chunk_pages, split_text, ChunkingConfig};
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, EmbeddingBackend, OpenAiEmbedder, OpenAiEmbedderConfig,
    DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{EmbeddingError, IndexError, IngestError, LlmError, PipelineError};
pub use extractor::{extract_page_texts, LopdfExtractor, PdfExtractor};
pub use fetcher::{DocumentFetcher, HttpPdfFetcher};
pub use index::InMemoryIndex;
pub use llm::{GeminiClient, GeminiConfig, LanguageModel, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use models::{
    Chunk, DocumentFingerprint, FetchedDocument, Page, PipelineOptions, QuestionOutcome,
    ScoredChunk, NOT_FOUND_IN_DOCUMENT, NO_RELEVANT_CONTEXT, SUMMARY_QUESTION, SYNTHESIS_FAILED,
};
pub use orchestrator::{PreparedDocument, RagCoordinator};
pub use retriever::retrieve;
pub use rewrite::{rewrite_query, QueryTopic};
pub use synthesize::{synthesize_answer, Synthesis};
pub use traits::VectorIndex;
