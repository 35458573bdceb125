//! Retrieval-augmented generation building blocks.
//!
//! ```text
//! Web page ──► ingestion::PageLoader ──► Document
//!                                          │
//!                        splitter::TextSplitter (size/overlap)
//!                                          │
//!                                        Chunks ──► embeddings::EmbeddingProvider
//!                                          │                   │
//!                                          └──► store::MemoryVectorStore ◄─ query vector
//!                                                              │
//! question (+ sessions history) ──► synthesis::AnswerSynthesizer ──► answer
//! ```
//!
//! The [`pipeline::RagPipeline`] wires the pieces together: index a document
//! once, then answer questions against it, optionally inside a session that
//! keeps chat history and rewrites follow-up questions into standalone form
//! before retrieval.

pub mod chat;
pub mod embeddings;
pub mod ingestion;
pub mod message;
pub mod pipeline;
pub mod sessions;
pub mod splitter;
pub mod store;
pub mod synthesis;
pub mod types;

pub use message::Message;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use splitter::{SplitterConfig, TextSplitter};
pub use store::{MemoryVectorStore, VectorStore};
pub use types::{Chunk, Document, RagError};
