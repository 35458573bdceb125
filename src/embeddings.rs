//! Embedding providers: text in, fixed-length vectors out.
//!
//! The services behind these providers are opaque boundaries; the only
//! contract is that a given model maps the same text to the same vector of a
//! fixed dimensionality.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::types::RagError;

/// Maps batches of text to embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in logs and telemetry.
    fn name(&self) -> &str;

    /// Embeds every input text, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no vector".to_string()))
    }
}

/// Embeddings served by a local Ollama daemon (`/api/embed`).
#[derive(Clone, Debug)]
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: Url,
    model: String,
}

impl OllamaEmbeddingProvider {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &'static str = "mxbai-embed-large";

    pub fn new(client: Client, base_url: Url, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = self
            .base_url
            .join("api/embed")
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let body: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        ensure_batch_shape(texts.len(), &body.embeddings)?;
        debug!(count = texts.len(), model = %self.model, "embedded batch via ollama");
        Ok(body.embeddings)
    }
}

/// Embeddings from the OpenAI `/v1/embeddings` endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiEmbeddingProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1/";
    pub const DEFAULT_MODEL: &'static str = "text-embedding-3-small";

    pub fn new(
        client: Client,
        base_url: Url,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedDatum>,
}

#[derive(Deserialize)]
struct OpenAiEmbedDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = self
            .base_url
            .join("embeddings")
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&OpenAiEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let body: OpenAiEmbedResponse = response
            .json()
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;

        let mut data = body.data;
        data.sort_by_key(|datum| datum.index);
        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|datum| datum.embedding).collect();
        ensure_batch_shape(texts.len(), &embeddings)?;
        Ok(embeddings)
    }
}

fn ensure_batch_shape(expected: usize, embeddings: &[Vec<f32>]) -> Result<(), RagError> {
    if embeddings.len() != expected {
        return Err(RagError::Embedding(format!(
            "expected {expected} vectors, service returned {}",
            embeddings.len()
        )));
    }
    Ok(())
}

/// Deterministic hash-derived vectors for tests and offline runs.
///
/// Identical text always maps to the identical vector, which is all the
/// retrieval tests need.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dims: 8 }
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dims))
            .collect())
    }
}

fn hash_to_vec(text: &str, dims: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dims)
        .map(|i| {
            let bits = seed.rotate_left((i as u32 % 64) * 8) ^ ((i as u64) << 24);
            (bits as f32) / u32::MAX as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2], "identical text, identical vector");
        assert_ne!(first[0], first[1], "different text, different vector");
    }

    #[tokio::test]
    async fn mock_embeddings_have_fixed_dimensionality() {
        let provider = MockEmbeddingProvider::with_dims(16);
        let vector = provider.embed("anything").await.unwrap();
        assert_eq!(vector.len(), 16);
    }
}
