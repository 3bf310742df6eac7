use crate::chunking::ChunkingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NOT_FOUND_IN_DOCUMENT: &str = "Information not found in the provided document.";
pub const SYNTHESIS_FAILED: &str = "Failed to process the document query request.";
pub const NO_RELEVANT_CONTEXT: &str =
    "Could not find any relevant information for this query in the document.";
pub const SUMMARY_QUESTION: &str = "Provide a comprehensive summary of this document including key points, main topics, and important details.";
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary";

pub const DEFAULT_TOP_K: usize = 5;

/// Text of one PDF page. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

/// A bounded fragment of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub source_url: String,
    pub checksum: String,
    pub byte_len: usize,
    pub page_count: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub fingerprint: DocumentFingerprint,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Result of answering one question. The fallback variants keep the answer
/// list aligned with the question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    Answered(String),
    NoRelevantContext,
    SynthesisFailed,
}

impl QuestionOutcome {
    pub fn into_answer(self) -> String {
        match self {
            Self::Answered(answer) => answer,
            Self::NoRelevantContext => NO_RELEVANT_CONTEXT.to_string(),
            Self::SynthesisFailed => SYNTHESIS_FAILED.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Answered(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_outcomes_map_to_fixed_strings() {
        assert_eq!(QuestionOutcome::NoRelevantContext.into_answer(), NO_RELEVANT_CONTEXT);
        assert_eq!(QuestionOutcome::SynthesisFailed.into_answer(), SYNTHESIS_FAILED);
        assert_eq!(
            QuestionOutcome::Answered("Thirty days.".to_string()).into_answer(),
            "Thirty days."
        );
    }

    #[test]
    fn default_options_retrieve_five_chunks() {
        let options = PipelineOptions::default();
        assert_eq!(options.top_k, 5);
        assert_eq!(options.chunking.chunk_size, 1_200);
        assert_eq!(options.chunking.chunk_overlap, 200);
    }
}
