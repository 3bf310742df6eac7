use crate::chunking::chunk_pages;
use crate::embeddings::Embedder;
use crate::error::{IndexError, PipelineError};
use crate::fetcher::DocumentFetcher;
use crate::index::InMemoryIndex;
use crate::llm::LanguageModel;
use crate::models::{
    DocumentFingerprint, PipelineOptions, QuestionOutcome, SUMMARY_QUESTION, SUMMARY_UNAVAILABLE,
};
use crate::retriever::retrieve;
use crate::rewrite::rewrite_query;
use crate::synthesize::{join_context, synthesize_answer, Synthesis};
use crate::traits::VectorIndex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// A document that has been fetched, chunked and indexed for one request.
#[derive(Debug)]
pub struct PreparedDocument {
    pub fingerprint: DocumentFingerprint,
    pub chunk_count: usize,
    pub index: InMemoryIndex,
}

/// Runs fetch, chunk and index once per document, then rewrite, retrieve and
/// synthesize once per question.
#[derive(Clone)]
pub struct RagCoordinator {
    fetcher: Arc<dyn DocumentFetcher>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    options: PipelineOptions,
}

impl RagCoordinator {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            llm,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn embedder_name(&self) -> String {
        self.embedder.describe()
    }

    pub async fn prepare_document(&self, url: &str) -> Result<PreparedDocument, PipelineError> {
        let document = self.fetcher.fetch(url).await.map_err(|error| {
            warn!(url, %error, "document fetch failed");
            PipelineError::Document(error)
        })?;

        let chunks = chunk_pages(&document.pages, &self.options.chunking);
        let chunk_count = chunks.len();
        info!(url, pages = document.pages.len(), chunks = chunk_count, "document chunked");

        let index = InMemoryIndex::build(chunks, self.embedder.as_ref())
            .await
            .map_err(|error: IndexError| {
                warn!(url, %error, "vector index construction failed");
                PipelineError::Index(error)
            })?;

        Ok(PreparedDocument {
            fingerprint: document.fingerprint,
            chunk_count,
            index,
        })
    }

    pub async fn answer_question<I>(&self, index: &I, question: &str) -> QuestionOutcome
    where
        I: VectorIndex + ?Sized,
    {
        let topic = rewrite_query(self.llm.as_ref(), question).await;
        info!(topic = topic.as_str(), rewritten = topic.is_rewritten(), "query topic");

        let hits = match retrieve(index, self.embedder.as_ref(), topic.as_str(), self.options.top_k)
            .await
        {
            Ok(hits) => hits,
            Err(error) => {
                warn!(%error, "query embedding failed");
                Vec::new()
            }
        };

        if hits.is_empty() {
            return QuestionOutcome::NoRelevantContext;
        }

        let context = join_context(&hits);
        match synthesize_answer(self.llm.as_ref(), &context, question).await {
            Synthesis::Answered(answer) => QuestionOutcome::Answered(answer),
            Synthesis::Failed => QuestionOutcome::SynthesisFailed,
        }
    }

    /// One answer per question, in question order.
    pub async fn answer_questions<I>(&self, index: &I, questions: &[String]) -> Vec<String>
    where
        I: VectorIndex + ?Sized,
    {
        let mut answers = Vec::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            info!(
                query = position + 1,
                total = questions.len(),
                question = %question,
                "processing query"
            );
            let outcome = self.answer_question(index, question).await;
            if outcome.is_fallback() {
                warn!(query = position + 1, outcome = ?outcome, "query answered with fallback");
            }
            answers.push(outcome.into_answer());
        }
        answers
    }

    pub async fn run(&self, url: &str, questions: &[String]) -> Result<Vec<String>, PipelineError> {
        let started = Instant::now();
        let prepared = self.prepare_document(url).await?;
        info!(
            url,
            checksum = %prepared.fingerprint.checksum,
            chunks = prepared.chunk_count,
            questions = questions.len(),
            "document ready"
        );

        let answers = self.answer_questions(&prepared.index, questions).await;
        info!(
            url,
            answers = answers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document analysis complete"
        );
        Ok(answers)
    }

    pub async fn summarize(&self, url: &str) -> Result<String, PipelineError> {
        let answers = self.run(url, &[SUMMARY_QUESTION.to_string()]).await?;
        Ok(answers
            .into_iter()
            .next()
            .unwrap_or_else(|| SUMMARY_UNAVAILABLE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::error::{IngestError, LlmError};
    use crate::models::{
        Chunk, FetchedDocument, Page, ScoredChunk, NO_RELEVANT_CONTEXT, SYNTHESIS_FAILED,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeFetcher {
        pages: Option<Vec<Page>>,
    }

    #[async_trait]
    impl DocumentFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedDocument, IngestError> {
            let pages = self.pages.clone().ok_or(IngestError::FetchStatus {
                url: url.to_string(),
                status: 404,
            })?;
            Ok(FetchedDocument {
                fingerprint: DocumentFingerprint {
                    source_url: url.to_string(),
                    checksum: "checksum".to_string(),
                    byte_len: 0,
                    page_count: pages.len(),
                    fetched_at: Utc::now(),
                },
                pages,
            })
        }
    }

    /// Answers rewrite prompts with malformed JSON and echoes the question
    /// back for answer prompts, failing on questions containing "explode".
    #[derive(Default)]
    struct ScriptedModel {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            if let Ok(mut calls) = self.calls.lock() {
                *calls += 1;
            }
            if prompt.contains("Respond ONLY with the JSON object.") {
                return Ok("definitely { not json".to_string());
            }
            if prompt.contains("explode") {
                return Err(LlmError::EmptyCompletion);
            }
            let question = prompt
                .split("**User Query:**\n---\n")
                .nth(1)
                .and_then(|rest| rest.split("\n---").next())
                .unwrap_or_default();
            Ok(format!("Answer to: {question}"))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Index that finds nothing for topics mentioning "unrelated".
    struct SelectiveIndex;

    impl VectorIndex for SelectiveIndex {
        fn search(&self, query_vector: &[f32], _k: usize) -> Vec<ScoredChunk> {
            let unrelated = CharacterNgramEmbedder::default().embed_text("unrelated");
            if query_vector == unrelated.as_slice() {
                return Vec::new();
            }
            vec![ScoredChunk {
                chunk: Chunk {
                    source_page: 1,
                    text: "The grace period is thirty days.".to_string(),
                },
                score: 1.0,
            }]
        }

        fn len(&self) -> usize {
            1
        }
    }

    fn coordinator(pages: Option<Vec<Page>>) -> (RagCoordinator, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::default());
        let coordinator = RagCoordinator::new(
            Arc::new(FakeFetcher { pages }),
            Arc::new(CharacterNgramEmbedder::default()),
            model.clone(),
            PipelineOptions::default(),
        );
        (coordinator, model)
    }

    fn policy_pages() -> Vec<Page> {
        vec![
            Page {
                page_number: 1,
                text: "The grace period for premium payment is thirty days.".to_string(),
            },
            Page {
                page_number: 2,
                text: "Cataract surgery has a waiting period of two years.".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn answers_align_with_questions() {
        let (coordinator, model) = coordinator(Some(policy_pages()));
        let questions = vec![
            "What is the grace period?".to_string(),
            "What is the cataract waiting period?".to_string(),
            "Is maternity covered?".to_string(),
        ];

        let answers = coordinator
            .run("https://example.com/policy.pdf", &questions)
            .await
            .expect("pipeline should succeed");

        assert_eq!(answers.len(), questions.len());
        for (answer, question) in answers.iter().zip(&questions) {
            assert_eq!(answer, &format!("Answer to: {question}"));
        }
        assert_eq!(model.calls.lock().map(|calls| *calls).unwrap_or(0), 6);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_request() {
        let (coordinator, model) = coordinator(None);
        let result = coordinator
            .run("https://example.com/missing.pdf", &["q".to_string()])
            .await;

        assert!(matches!(result, Err(PipelineError::Document(_))));
        assert_eq!(model.calls.lock().map(|calls| *calls).unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn whitespace_only_pages_fail_index_construction() {
        let (coordinator, _) = coordinator(Some(vec![Page {
            page_number: 1,
            text: "\n \n".to_string(),
        }]));
        let result = coordinator.prepare_document("https://example.com/blank.pdf").await;

        assert!(matches!(
            result,
            Err(PipelineError::Index(IndexError::NoChunks))
        ));
    }

    #[tokio::test]
    async fn empty_retrieval_degrades_only_that_question() {
        let (coordinator, _) = coordinator(Some(policy_pages()));
        let questions = vec![
            "grace period".to_string(),
            "unrelated".to_string(),
            "thirty days".to_string(),
        ];

        let answers = coordinator.answer_questions(&SelectiveIndex, &questions).await;

        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0], "Answer to: grace period");
        assert_eq!(answers[1], NO_RELEVANT_CONTEXT);
        assert_eq!(answers[2], "Answer to: thirty days");
    }

    #[tokio::test]
    async fn synthesis_failure_does_not_stop_later_questions() {
        let (coordinator, _) = coordinator(Some(policy_pages()));
        let questions = vec!["please explode".to_string(), "grace period".to_string()];

        let answers = coordinator.answer_questions(&SelectiveIndex, &questions).await;

        assert_eq!(answers, vec![
            SYNTHESIS_FAILED.to_string(),
            "Answer to: grace period".to_string()
        ]);
    }

    #[tokio::test]
    async fn repeated_requests_use_the_same_source_text() {
        let (coordinator, _) = coordinator(Some(policy_pages()));

        let first = coordinator.prepare_document("https://example.com/p.pdf").await.unwrap();
        let second = coordinator.prepare_document("https://example.com/p.pdf").await.unwrap();
        let query = CharacterNgramEmbedder::default().embed_text("grace period");

        assert_eq!(first.chunk_count, second.chunk_count);
        assert_eq!(first.index.search(&query, 1), second.index.search(&query, 1));
    }

    #[tokio::test]
    async fn summary_returns_single_answer() {
        let (coordinator, _) = coordinator(Some(policy_pages()));
        let summary = coordinator
            .summarize("https://example.com/policy.pdf")
            .await
            .expect("summary should succeed");
        assert_eq!(summary, format!("Answer to: {SUMMARY_QUESTION}"));
    }
}
