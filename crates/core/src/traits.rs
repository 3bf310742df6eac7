use crate::models::ScoredChunk;

/// Similarity search over embedded chunks.
pub trait VectorIndex: Send + Sync {
    /// Returns at most `k` chunks, most similar first.
    fn search(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
