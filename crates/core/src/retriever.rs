use crate::embeddings::Embedder;
use crate::error::EmbeddingError;
use crate::models::ScoredChunk;
use crate::traits::VectorIndex;
use tracing::debug;

/// Embeds `topic` and returns up to `k` of the closest chunks.
pub async fn retrieve<I>(
    index: &I,
    embedder: &dyn Embedder,
    topic: &str,
    k: usize,
) -> Result<Vec<ScoredChunk>, EmbeddingError>
where
    I: VectorIndex + ?Sized,
{
    if k == 0 {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed(topic).await?;
    let hits = index.search(&query_vector, k);
    debug!(topic, hits = hits.len(), "retrieved chunks");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::index::InMemoryIndex;
    use crate::models::Chunk;

    async fn sample_index(embedder: &CharacterNgramEmbedder) -> InMemoryIndex {
        let chunks = [
            "The grace period for premium payment is thirty days.",
            "Maternity expenses are covered after twenty four months.",
            "Cataract surgery has a waiting period of two years.",
        ]
        .iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            source_page: index as u32 + 1,
            text: text.to_string(),
        })
        .collect();

        InMemoryIndex::build(chunks, embedder).await.unwrap()
    }

    #[tokio::test]
    async fn closest_chunk_comes_first() {
        let embedder = CharacterNgramEmbedder::default();
        let index = sample_index(&embedder).await;

        let hits = retrieve(&index, &embedder, "grace period premium payment", 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.source_page, 1);
    }

    #[tokio::test]
    async fn same_topic_gives_same_results() {
        let embedder = CharacterNgramEmbedder::default();
        let index = sample_index(&embedder).await;

        let first = retrieve(&index, &embedder, "waiting period", 3).await.unwrap();
        let second = retrieve(&index, &embedder, "waiting period", 3).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn zero_k_returns_nothing() {
        let embedder = CharacterNgramEmbedder::default();
        let index = sample_index(&embedder).await;
        assert!(retrieve(&index, &embedder, "anything", 0).await.unwrap().is_empty());
    }
}
