//! Conversational RAG run: index a blog post, then hold a short multi-turn
//! session where follow-up questions lean on chat history.
//!
//! Follow-ups like "What are common ways of doing it?" have no explicit
//! subject; the pipeline rewrites them into standalone questions before
//! retrieval so they still match relevant chunks.

use std::env;
use std::sync::Arc;

use reqwest::Client;
use tracing_subscriber::FmtSubscriber;
use url::Url;

use ragloom::RagPipeline;
use ragloom::chat::OllamaChatModel;
use ragloom::embeddings::OllamaEmbeddingProvider;
use ragloom::ingestion::{PageCache, PageLoader};
use ragloom::sessions::SessionStore;
use ragloom::types::RagError;

const QUESTIONS: [&str; 3] = [
    "What is Task Decomposition?",
    "What are common ways of doing it?",
    "Of those, pick one and go into more detail.",
];

#[tokio::main]
async fn main() -> Result<(), RagError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let source_url = env::var("RAG_SOURCE_URL")
        .unwrap_or_else(|_| "https://lilianweng.github.io/posts/2023-06-23-agent/".to_string());
    let source_url =
        Url::parse(&source_url).map_err(|err| RagError::InvalidDocument(err.to_string()))?;

    let ollama_url = env::var("OLLAMA_BASE_URL")
        .unwrap_or_else(|_| OllamaEmbeddingProvider::DEFAULT_BASE_URL.to_string());
    let ollama_url =
        Url::parse(&ollama_url).map_err(|err| RagError::InvalidConfig(err.to_string()))?;
    let embed_model = env::var("RAG_EMBED_MODEL")
        .unwrap_or_else(|_| OllamaEmbeddingProvider::DEFAULT_MODEL.to_string());
    let chat_model =
        env::var("RAG_CHAT_MODEL").unwrap_or_else(|_| OllamaChatModel::DEFAULT_MODEL.to_string());

    let client = Client::builder()
        .user_agent("ragloom/0.1")
        .use_rustls_tls()
        .build()?;

    let loader = PageLoader::new(client.clone())
        .with_selector(".post-content, .post-title, .post-header")
        .with_cache(PageCache::new("./page_cache"));
    let document = loader.load(&source_url).await?;

    let mut pipeline = RagPipeline::builder()
        .embedding_provider(Arc::new(OllamaEmbeddingProvider::new(
            client.clone(),
            ollama_url.clone(),
            embed_model,
        )))
        .chat_model(Arc::new(OllamaChatModel::new(
            client,
            ollama_url,
            chat_model,
        )))
        .build()?;

    let indexed = pipeline.index_document(&document).await?;
    println!("indexed {indexed} chunks from {source_url}\n");

    let sessions = SessionStore::new();
    let session_id = "session1";

    for question in QUESTIONS {
        println!("Q: {question}");
        let answer = pipeline.ask_in_session(&sessions, session_id, question).await?;
        println!("A: {answer}\n");
    }

    println!(
        "session '{session_id}' recorded {} messages",
        sessions.turn_count(session_id)
    );

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
