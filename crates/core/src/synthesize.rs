use crate::llm::LanguageModel;
use crate::models::{ScoredChunk, NOT_FOUND_IN_DOCUMENT, SYNTHESIS_FAILED};
use tracing::warn;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    Answered(String),
    Failed,
}

impl Synthesis {
    pub fn into_text(self) -> String {
        match self {
            Self::Answered(answer) => answer,
            Self::Failed => SYNTHESIS_FAILED.to_string(),
        }
    }
}

pub fn join_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn build_answer_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are an expert document analyst.
Your task is to analyze queries based **STRICTLY AND ONLY** on the provided document context.

**Provided Document Context:**
---
{context}
---

**User Query:**
---
{question}
---

**Your Task:**
Analyze the query against the document and provide a structured response with:
1. **Decision**: Relevant information found/Not found/Partially found
2. **Details**: Specific information extracted from the document
3. **Justification**: Clear explanation with specific document references
4. **Document Mapping**: Reference the exact sections/clauses used

**Response Format:**
Provide a clear, professional response that includes:
- Whether the requested information is available in the document
- Specific document sections that apply
- Any relevant conditions, terms, or requirements
- Key details and amounts if mentioned
- Clear reasoning for the response

If the context **DOES NOT** contain relevant information, respond with: "{NOT_FOUND_IN_DOCUMENT}""#
    )
}

/// Answers `question` from `context` with one model call. The answer text is
/// never empty.
pub async fn synthesize_answer(llm: &dyn LanguageModel, context: &str, question: &str) -> Synthesis {
    match llm.complete(&build_answer_prompt(context, question)).await {
        Ok(answer) => {
            let answer = answer.trim();
            if answer.is_empty() {
                Synthesis::Answered(NOT_FOUND_IN_DOCUMENT.to_string())
            } else {
                Synthesis::Answered(answer.to_string())
            }
        }
        Err(error) => {
            warn!(%error, "answer synthesis failed");
            Synthesis::Failed
        }
    }
}
