//! Prompt assembly and answer synthesis.
//!
//! The synthesizer stuffs retrieved chunk texts into a system prompt, threads
//! in any prior conversation turns, and forwards the whole sequence to a
//! [`ChatModel`]. For conversational use it can first rewrite a follow-up
//! question into standalone form so retrieval still matches relevant chunks.

use std::sync::Arc;

use tracing::debug;

use crate::chat::ChatModel;
use crate::message::Message;
use crate::types::{Chunk, RagError};

/// System prompt for the question-answering step. Retrieved context is
/// appended after a blank line.
pub const QA_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// System prompt for rewriting a follow-up question into standalone form.
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, \
formulate a standalone question which can be understood \
without the chat history. Do NOT answer the question, \
just reformulate it if needed and otherwise return it as is.";

/// Joins chunk texts into the context block for the QA prompt.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the QA message sequence: system prompt with context, prior turns,
/// then the current question.
pub fn qa_messages(context: &str, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(&format!("{QA_SYSTEM_PROMPT}\n\n{context}")));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(question));
    messages
}

/// Builds the rewrite message sequence: rewrite instructions, prior turns,
/// then the question to reformulate.
pub fn rewrite_messages(history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(CONTEXTUALIZE_SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(question));
    messages
}

/// Turns retrieved chunks and conversation history into model answers.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Answers `question` from the retrieved chunks, returning the model
    /// output verbatim.
    ///
    /// An empty chunk list still invokes the model with empty context; the
    /// system prompt instructs it to admit not knowing.
    pub async fn answer(
        &self,
        question: &str,
        chunks: &[Chunk],
        history: &[Message],
    ) -> Result<String, RagError> {
        let context = format_context(chunks);
        debug!(
            chunks = chunks.len(),
            history_turns = history.len(),
            model = self.model.name(),
            "synthesizing answer"
        );
        self.model
            .complete(&qa_messages(&context, history, question))
            .await
    }

    /// Rewrites a follow-up question into standalone form using the prior
    /// turns. With no history the question is returned unchanged and no model
    /// call is made.
    pub async fn rewrite_question(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<String, RagError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }
        self.model
            .complete(&rewrite_messages(history, question))
            .await
    }
}
