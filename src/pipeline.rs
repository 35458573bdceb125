//! End-to-end composition: split, embed, store, retrieve, answer.

use std::sync::Arc;

use tracing::info;

use crate::chat::ChatModel;
use crate::embeddings::EmbeddingProvider;
use crate::message::Message;
use crate::sessions::SessionStore;
use crate::splitter::{SplitterConfig, TextSplitter};
use crate::store::{EmbeddedChunk, MemoryVectorStore, VectorStore};
use crate::synthesis::AnswerSynthesizer;
use crate::types::{Chunk, Document, RagError};

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

/// One retrieval-augmented question-answering pipeline over an in-memory
/// index.
///
/// Build with [`RagPipeline::builder`], index one or more documents, then ask
/// questions either one-shot or within a session that keeps history.
pub struct RagPipeline {
    embeddings: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    splitter: TextSplitter,
    store: MemoryVectorStore,
    top_k: usize,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("splitter", &self.splitter)
            .field("store", &self.store)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Splits and embeds a document, adding its chunks to the index.
    ///
    /// Returns the number of chunks stored.
    pub async fn index_document(&mut self, document: &Document) -> Result<usize, RagError> {
        let chunks = self.splitter.split_documents(std::slice::from_ref(document));
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;
        let count = chunks.len();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            self.store.add(EmbeddedChunk { chunk, vector })?;
        }
        info!(
            chunks = count,
            store_size = self.store.len(),
            provider = self.embeddings.name(),
            "indexed document"
        );
        Ok(count)
    }

    /// Embeds the question and returns the top-k chunks, best first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<(Chunk, f32)>, RagError> {
        let query = self.embeddings.embed(question).await?;
        self.store.top_k(&query, self.top_k).await
    }

    /// One-shot question answering with no conversation history.
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        let chunks = strip_scores(self.retrieve(question).await?);
        self.synthesizer.answer(question, &chunks, &[]).await
    }

    /// Conversational question answering.
    ///
    /// The latest question is first rewritten into standalone form using the
    /// session's history so follow-ups without explicit subjects still
    /// retrieve relevant chunks. The answer and the original question are
    /// appended to the session afterwards.
    pub async fn ask_in_session(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        question: &str,
    ) -> Result<String, RagError> {
        let history = sessions.history(session_id);
        let standalone = self.synthesizer.rewrite_question(question, &history).await?;
        if standalone != question {
            info!(session = session_id, %standalone, "rewrote follow-up question");
        }
        let chunks = strip_scores(self.retrieve(&standalone).await?);
        let answer = self.synthesizer.answer(question, &chunks, &history).await?;

        sessions.append(session_id, Message::user(question));
        sessions.append(session_id, Message::assistant(&answer));
        Ok(answer)
    }

    pub fn store(&self) -> &MemoryVectorStore {
        &self.store
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

fn strip_scores(scored: Vec<(Chunk, f32)>) -> Vec<Chunk> {
    scored.into_iter().map(|(chunk, _)| chunk).collect()
}

/// Builder for [`RagPipeline`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    chat: Option<Arc<dyn ChatModel>>,
    splitter_config: Option<SplitterConfig>,
    top_k: Option<usize>,
}

impl RagPipelineBuilder {
    #[must_use]
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    #[must_use]
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(model);
        self
    }

    /// Overrides the default 1000/200 splitter configuration.
    #[must_use]
    pub fn splitter_config(mut self, config: SplitterConfig) -> Self {
        self.splitter_config = Some(config);
        self
    }

    #[must_use]
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Builds the pipeline, validating the splitter configuration.
    pub fn build(self) -> Result<RagPipeline, RagError> {
        let embeddings = self.embeddings.ok_or_else(|| {
            RagError::InvalidConfig("pipeline requires an embedding provider".to_string())
        })?;
        let chat = self
            .chat
            .ok_or_else(|| RagError::InvalidConfig("pipeline requires a chat model".to_string()))?;
        let splitter = TextSplitter::new(self.splitter_config.unwrap_or_default())?;
        Ok(RagPipeline {
            embeddings,
            synthesizer: AnswerSynthesizer::new(chat),
            splitter,
            store: MemoryVectorStore::new(),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
        })
    }
}
