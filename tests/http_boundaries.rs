//! Tests for the HTTP boundaries (page loading, embedding and chat
//! providers) against a local mock server.

use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;
use tempfile::tempdir;
use url::Url;

use ragloom::Message;
use ragloom::chat::{ChatModel, OllamaChatModel, OpenAiChatModel};
use ragloom::embeddings::{EmbeddingProvider, OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use ragloom::ingestion::{PageCache, PageLoader};
use ragloom::types::RagError;

const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <header class="post-header"><h1 class="post-title">LLM Powered Agents</h1></header>
  <nav>site navigation</nav>
  <div class="post-content">
    <p>Task decomposition breaks a complicated task into smaller steps.</p>
  </div>
</body></html>"#;

fn client() -> Client {
    Client::builder().build().unwrap()
}

#[tokio::test]
async fn loader_extracts_scoped_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/posts/agents");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(PAGE);
        })
        .await;

    let url = Url::parse(&server.url("/posts/agents")).unwrap();
    let loader =
        PageLoader::new(client()).with_selector(".post-content, .post-title, .post-header");
    let document = loader.load(&url).await.unwrap();

    mock.assert_async().await;
    assert!(document.text.contains("LLM Powered Agents"));
    assert!(document.text.contains("Task decomposition"));
    assert!(!document.text.contains("site navigation"));
    assert_eq!(
        document.metadata.get("source").map(String::as_str),
        Some(url.as_str())
    );
}

#[tokio::test]
async fn loader_surfaces_non_success_status_as_fetch_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;

    let url = Url::parse(&server.url("/missing")).unwrap();
    let err = PageLoader::new(client()).load(&url).await.unwrap_err();
    assert!(matches!(err, RagError::Fetch(_)));
}

#[tokio::test]
async fn loader_reuses_cached_pages() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/cached");
            then.status(200).body(PAGE);
        })
        .await;

    let dir = tempdir().unwrap();
    let url = Url::parse(&server.url("/cached")).unwrap();
    let loader = PageLoader::new(client()).with_cache(PageCache::new(dir.path()));

    let first = loader.load(&url).await.unwrap();
    let second = loader.load(&url).await.unwrap();

    assert_eq!(first.text, second.text);
    assert_eq!(mock.hits_async().await, 1, "second load must come from disk");
}

#[tokio::test]
async fn ollama_embeddings_parse_and_preserve_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/embed")
                .json_body_partial(r#"{"model": "mxbai-embed-large"}"#);
            then.status(200).json_body(json!({
                "model": "mxbai-embed-large",
                "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
            }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let provider = OllamaEmbeddingProvider::new(client(), base, "mxbai-embed-large");
    let vectors = provider
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
}

#[tokio::test]
async fn ollama_embeddings_reject_short_batches() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200).json_body(json!({ "embeddings": [[0.1]] }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let provider = OllamaEmbeddingProvider::new(client(), base, "mxbai-embed-large");
    let err = provider
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn openai_embeddings_are_returned_in_input_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "text-embedding-3-small"}"#);
            // The service may answer out of index order.
            then.status(200).json_body(json!({
                "data": [
                    { "index": 1, "embedding": [0.4, 0.5, 0.6] },
                    { "index": 0, "embedding": [0.1, 0.2, 0.3] }
                ]
            }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let provider =
        OpenAiEmbeddingProvider::new(client(), base, "test-key", "text-embedding-3-small");
    let vectors = provider
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
}

#[tokio::test]
async fn openai_chat_returns_the_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "gpt-4o-mini", "temperature": 0.0}"#);
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "first choice" } },
                    { "message": { "role": "assistant", "content": "second choice" } }
                ]
            }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let model = OpenAiChatModel::new(client(), base, "test-key", "gpt-4o-mini");
    let answer = model
        .complete(&[Message::user("What is Task Decomposition?")])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "first choice");
}

#[tokio::test]
async fn openai_chat_without_choices_is_a_completion_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let model = OpenAiChatModel::new(client(), base, "test-key", "gpt-4o-mini");
    let err = model
        .complete(&[Message::user("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Completion(_)));
}

#[tokio::test]
async fn ollama_chat_returns_completion_verbatim() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .json_body_partial(r#"{"model": "llama3.2", "stream": false}"#);
            then.status(200).json_body(json!({
                "model": "llama3.2",
                "message": {
                    "role": "assistant",
                    "content": "Task decomposition splits work into steps."
                },
                "done": true
            }));
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let model = OllamaChatModel::new(client(), base, "llama3.2");
    let answer = model
        .complete(&[
            Message::system("You are a helpful assistant."),
            Message::user("What is Task Decomposition?"),
        ])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "Task decomposition splits work into steps.");
}

#[tokio::test]
async fn chat_service_errors_surface_as_completion_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(429);
        })
        .await;

    let base = Url::parse(&server.base_url()).unwrap();
    let model = OllamaChatModel::new(client(), base, "llama3.2");
    let err = model
        .complete(&[Message::user("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Completion(_)));
}
