use crate::embeddings::Embedder;
use crate::error::{EmbeddingError, IndexError};
use crate::models::{Chunk, ScoredChunk};
use crate::traits::VectorIndex;
use tracing::info;

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Exact cosine-similarity index held in memory for a single request.
#[derive(Debug, Clone)]
pub struct InMemoryIndex {
    dimensions: usize,
    entries: Vec<IndexedChunk>,
}

impl InMemoryIndex {
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::NoChunks);
        }

        info!(chunks = chunks.len(), embedder = %embedder.describe(), "building vector index");
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        let index = Self::from_vectors(chunks, vectors)?;
        info!(chunks = index.len(), dimensions = index.dimensions, "vector index ready");

        Ok(index)
    }

    pub fn from_vectors(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::NoChunks);
        }
        if chunks.len() != vectors.len() {
            return Err(IndexError::Embedding(EmbeddingError::CountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            }));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(IndexError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, mut vector)| {
                if vector.len() != dimensions {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimensions,
                        actual: vector.len(),
                    });
                }
                normalize(&mut vector);
                Ok(IndexedChunk { chunk, vector })
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        Ok(Self {
            dimensions,
            entries,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl VectorIndex for InMemoryIndex {
    fn search(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        if k == 0 || query_vector.len() != self.dimensions {
            return Vec::new();
        }

        let mut query = query_vector.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, dot_similarity(&query, &entry.vector)))
            .collect();

        // Ties resolve to the earlier chunk so results are stable.
        scored.sort_by(|left, right| {
            right
                .1
                .total_cmp(&left.1)
                .then_with(|| left.0.cmp(&right.0))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(position, score)| ScoredChunk {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|value| *value /= norm);
    }
}

/// Equals cosine similarity when both vectors are normalized.
pub fn dot_similarity(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use async_trait::async_trait;

    fn chunk(page: u32, text: &str) -> Chunk {
        Chunk {
            source_page: page,
            text: text.to_string(),
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::BackendResponse {
                backend: "test".to_string(),
                details: "down".to_string(),
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[tokio::test]
    async fn empty_chunk_list_is_reported() {
        let result = InMemoryIndex::build(Vec::new(), &CharacterNgramEmbedder::default()).await;
        assert!(matches!(result, Err(IndexError::NoChunks)));
    }

    #[tokio::test]
    async fn embedding_failure_is_reported() {
        let result = InMemoryIndex::build(vec![chunk(1, "text")], &FailingEmbedder).await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
    }

    #[test]
    fn search_orders_by_similarity_and_limits_to_k() {
        let index = InMemoryIndex::from_vectors(
            vec![chunk(1, "east"), chunk(2, "north"), chunk(3, "north-east")],
            vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0]],
        )
        .unwrap();

        let hits = index.search(&[0.0, 1.0], 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "north");
        assert_eq!(hits[1].chunk.text, "north-east");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_resolve_to_insertion_order() {
        let index = InMemoryIndex::from_vectors(
            vec![chunk(1, "first"), chunk(2, "second")],
            vec![vec![1.0, 0.0], vec![3.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "first");
        assert_eq!(hits[1].chunk.text, "second");
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let result = InMemoryIndex::from_vectors(
            vec![chunk(1, "a"), chunk(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn wrong_query_dimension_returns_nothing() {
        let index =
            InMemoryIndex::from_vectors(vec![chunk(1, "a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 3).is_empty());
        assert!(index.search(&[1.0, 0.0], 0).is_empty());
    }
}
