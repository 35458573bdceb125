//! In-memory vector storage and nearest-neighbor lookup.
//!
//! Entries are 1:1 with the chunks produced at index-build time; the set only
//! grows through bulk construction. There is no persistence, update, or
//! delete path.

use async_trait::async_trait;
use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, RagError};

/// A chunk paired with its embedding vector.
///
/// Created once per chunk when the index is built and never mutated.
#[derive(Clone, Debug)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Nearest-neighbor lookup over embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `k` chunks scored against `query`, best first.
    ///
    /// Scores are non-increasing across the returned sequence; ties keep
    /// insertion order.
    async fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>, RagError>;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vector store holding every entry in process memory.
///
/// Similarity is cosine; all stored vectors must share one dimensionality,
/// fixed by the first entry.
#[derive(Clone, Debug, Default)]
pub struct MemoryVectorStore {
    entries: Vec<EmbeddedChunk>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-builds a store by embedding every chunk with `provider`.
    pub async fn from_chunks(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<Chunk>,
    ) -> Result<Self, RagError> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        debug!(
            chunks = chunks.len(),
            provider = provider.name(),
            "embedded chunks for vector store"
        );

        let mut store = Self::new();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            store.add(EmbeddedChunk { chunk, vector })?;
        }
        Ok(store)
    }

    /// Appends one embedded chunk, enforcing a consistent dimensionality.
    pub fn add(&mut self, entry: EmbeddedChunk) -> Result<(), RagError> {
        if let Some(first) = self.entries.first() {
            if first.vector.len() != entry.vector.len() {
                return Err(RagError::InvalidConfig(format!(
                    "embedding dimension mismatch: store holds {}, entry has {}",
                    first.vector.len(),
                    entry.vector.len()
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    fn dims(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.vector.len())
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>, RagError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if let Some(dims) = self.dims() {
            if query.len() != dims {
                return Err(RagError::InvalidConfig(format!(
                    "query dimension mismatch: store holds {dims}, query has {}",
                    query.len()
                )));
            }
        }

        let mut scored: Vec<(Chunk, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry.chunk.clone(), cosine_similarity(query, &entry.vector)))
            .collect();
        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cosine similarity; zero-magnitude vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk::new(text, index, Metadata::new())
    }

    fn entry(text: &str, index: usize, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: chunk(text, index),
            vector,
        }
    }

    fn sample_store() -> MemoryVectorStore {
        let mut store = MemoryVectorStore::new();
        store.add(entry("north", 0, vec![0.0, 1.0])).unwrap();
        store.add(entry("east", 1, vec![1.0, 0.0])).unwrap();
        store.add(entry("north-east", 2, vec![1.0, 1.0])).unwrap();
        store
    }

    #[tokio::test]
    async fn top_k_orders_by_similarity() {
        let store = sample_store();
        let results = store.top_k(&[0.0, 1.0], 3).await.unwrap();
        assert_eq!(results[0].0.text, "north");
        assert_eq!(results[1].0.text, "north-east");
        assert_eq!(results[2].0.text, "east");
        for window in results.windows(2) {
            assert!(window[0].1 >= window[1].1, "scores must be non-increasing");
        }
    }

    #[tokio::test]
    async fn top_k_is_bounded_by_k_and_store_size() {
        let store = sample_store();
        assert_eq!(store.top_k(&[1.0, 0.0], 2).await.unwrap().len(), 2);
        assert_eq!(store.top_k(&[1.0, 0.0], 10).await.unwrap().len(), 3);
        assert!(store.top_k(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let mut store = MemoryVectorStore::new();
        store.add(entry("first", 0, vec![1.0, 0.0])).unwrap();
        store.add(entry("second", 1, vec![2.0, 0.0])).unwrap();
        store.add(entry("third", 2, vec![0.5, 0.0])).unwrap();

        // Cosine similarity ignores magnitude, so all three tie.
        let results = store.top_k(&[1.0, 0.0], 3).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|(c, _)| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn rejects_mismatched_dimensions() {
        let mut store = sample_store();
        let err = store.add(entry("bad", 3, vec![1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));

        let err = store.top_k(&[1.0, 0.0, 0.0], 2).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn from_chunks_bulk_builds_the_index() {
        use crate::embeddings::MockEmbeddingProvider;

        let provider = MockEmbeddingProvider::new();
        let chunks = vec![
            chunk("task decomposition", 0),
            chunk("chain of thought", 1),
            chunk("tree of thoughts", 2),
        ];
        let store = MemoryVectorStore::from_chunks(&provider, chunks).await.unwrap();
        assert_eq!(store.len(), 3);

        let query = provider.embed("task decomposition").await.unwrap();
        let results = store.top_k(&query, 1).await.unwrap();
        assert_eq!(results[0].0.text, "task decomposition");
    }

    #[tokio::test]
    async fn empty_store_returns_no_results() {
        let store = MemoryVectorStore::new();
        assert!(store.top_k(&[1.0], 4).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
