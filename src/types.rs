//! Shared data types and the crate-wide error enum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to documents and chunks (source URL, selector, etc.).
pub type Metadata = BTreeMap<String, String>;

/// A loaded source document: plain text plus provenance metadata.
///
/// Documents are immutable once loaded; the splitter reads them but never
/// mutates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded substring of a parent [`Document`], sized for embedding and
/// retrieval.
///
/// Chunks inherit the parent document's metadata and record their zero-based
/// position within the split sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub chunk_index: usize,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, chunk_index: usize, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            chunk_index,
            metadata,
        }
    }
}

/// Errors surfaced by the RAG pipeline.
///
/// Network failures abort the run; there is no retry layer. Configuration
/// problems are rejected before any processing begins.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// Document fetch failed (network error or non-success status).
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Filesystem error while reading or writing cached documents.
    #[error("io error: {0}")]
    Io(String),

    /// The fetched resource could not be interpreted as a document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A component was constructed with invalid parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding service failed or returned an unusable response.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The completion service failed or returned an unusable response.
    #[error("completion failed: {0}")]
    Completion(String),
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Io(err.to_string())
    }
}
