//! Completion models: role-tagged messages in, generated text out.
//!
//! Completion services are opaque boundaries; the contract is only that a
//! message sequence maps to a text completion, possibly non-deterministic.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::message::Message;
use crate::types::RagError;

/// A chat-completion model endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Submits the message sequence and returns the completion verbatim.
    async fn complete(&self, messages: &[Message]) -> Result<String, RagError>;
}

/// Chat completions served by a local Ollama daemon (`/api/chat`).
#[derive(Clone, Debug)]
pub struct OllamaChatModel {
    client: Client,
    base_url: Url,
    model: String,
}

impl OllamaChatModel {
    pub const DEFAULT_MODEL: &'static str = "llama3.2";

    pub fn new(client: Client, base_url: Url, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, RagError> {
        let endpoint = self
            .base_url
            .join("api/chat")
            .map_err(|err| RagError::Completion(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .json(&OllamaChatRequest {
                model: &self.model,
                messages,
                stream: false,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RagError::Completion(err.to_string()))?;
        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|err| RagError::Completion(err.to_string()))?;
        debug!(model = %self.model, turns = messages.len(), "completion via ollama");
        Ok(body.message.content)
    }
}

/// Chat completions from the OpenAI `/v1/chat/completions` endpoint.
///
/// Temperature is pinned to 0 the way the answering flows expect.
#[derive(Clone, Debug)]
pub struct OpenAiChatModel {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1/";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

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
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Deserialize)]
struct OpenAiChatChoice {
    message: Message,
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, RagError> {
        let endpoint = self
            .base_url
            .join("chat/completions")
            .map_err(|err| RagError::Completion(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&OpenAiChatRequest {
                model: &self.model,
                messages,
                temperature: 0.0,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RagError::Completion(err.to_string()))?;
        let body: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|err| RagError::Completion(err.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Completion("service returned no choices".to_string()))
    }
}

/// Scripted chat model for deterministic tests.
///
/// Replies are served in the order they were queued; every received message
/// sequence is recorded for assertions.
#[derive(Debug, Default)]
pub struct MockChatModel {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockChatModel {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Message sequences received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, RagError> {
        self.calls.lock().push(messages.to_vec());
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| RagError::Completion("mock has no queued reply".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_serves_replies_in_order_and_records_calls() {
        let model = MockChatModel::new(["first", "second"]);
        let turn = [Message::user("hello")];

        assert_eq!(model.complete(&turn).await.unwrap(), "first");
        assert_eq!(model.complete(&turn).await.unwrap(), "second");
        assert!(model.complete(&turn).await.is_err());
        assert_eq!(model.calls().len(), 3);
    }
}
