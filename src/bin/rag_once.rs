//! One-shot RAG run: load a blog post, index it, answer a single question.
//!
//! Models are served by a local Ollama daemon by default; override the
//! endpoints and models through the environment:
//!
//! ```bash
//! RAG_SOURCE_URL=https://lilianweng.github.io/posts/2023-06-23-agent/ \
//! RAG_QUESTION="What is Task Decomposition?" \
//! cargo run --bin rag_once
//! ```

use std::env;
use std::sync::Arc;

use reqwest::Client;
use tracing_subscriber::FmtSubscriber;
use url::Url;

use ragloom::RagPipeline;
use ragloom::chat::OllamaChatModel;
use ragloom::embeddings::OllamaEmbeddingProvider;
use ragloom::ingestion::{PageCache, PageLoader};
use ragloom::types::RagError;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let source_url = env::var("RAG_SOURCE_URL")
        .unwrap_or_else(|_| "https://lilianweng.github.io/posts/2023-06-23-agent/".to_string());
    let source_url =
        Url::parse(&source_url).map_err(|err| RagError::InvalidDocument(err.to_string()))?;
    let selector = env::var("RAG_SELECTOR")
        .unwrap_or_else(|_| ".post-content, .post-title, .post-header".to_string());
    let question = env::var("RAG_QUESTION")
        .unwrap_or_else(|_| "What is Task Decomposition?".to_string());

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
        .with_selector(selector)
        .with_cache(PageCache::new("./page_cache"));
    let document = loader.load(&source_url).await?;
    println!(
        "loaded {} characters from {}",
        document.text.chars().count(),
        source_url
    );

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
    println!("indexed {indexed} chunks");

    let retrieved = pipeline.retrieve(&question).await?;
    println!("retrieved {} chunks:", retrieved.len());
    for (chunk, score) in &retrieved {
        let preview: String = chunk.text.chars().take(80).collect();
        println!("  [{score:.3}] #{} {preview}…", chunk.chunk_index);
    }

    let answer = pipeline.ask(&question).await?;
    println!("\nQ: {question}");
    println!("A: {answer}");

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
