//! Knowledge ingestion and retrieval over a file-backed vector store.
//!
//! Files are loaded, chunked, embedded, and written to the store with
//! per-source replacement, so ingesting the same file twice leaves one
//! copy of its chunks. Queries embed the question with the same provider
//! and rank stored chunks by cosine similarity.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod loader;
pub mod types;

// Re-export commonly used types
pub use config::KnowledgeConfig;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use loader::{parse_tag, FileDataLoader, LoadedBatch};
pub use types::{IngestOptions, IngestStats};

use loader::FILE_SOURCE_TYPE;
use neuron_core::{AppError, AppResult};
use neuron_store::{Document, FileVectorStore, SourceSummary, StoreStats, VectorStore};
use std::time::Instant;

/// Texts sent to the provider per request batch.
const EMBED_BATCH_SIZE: usize = 32;

/// Load, embed, and store the given paths.
///
/// Every source found replaces its previous records in the store. Sources
/// that are now empty have their old records removed. Nothing is written
/// if loading or embedding fails.
pub async fn ingest(config: &KnowledgeConfig, options: &IngestOptions) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!("Starting ingest of {} paths", options.paths.len());

    let batch = FileDataLoader::new(config.chunk_size, config.chunk_overlap)
        .with_tags(options.tags.clone())
        .load(&options.paths)?;

    let provider = create_provider(&config.embedding).await?;
    let documents = embed_documents(provider.as_ref(), batch.documents).await?;

    let mut store = FileVectorStore::new(config.store.clone());
    let mut removed = store.reindex_by_source(&documents)?;
    for name in &batch.empty_sources {
        removed += store.delete_by_source(FILE_SOURCE_TYPE, name)?;
    }

    let duration = start.elapsed();

    tracing::info!(
        "Ingest completed: {} sources, {} documents, {} replaced, {} bytes in {:.2}s",
        batch.sources,
        documents.len(),
        removed,
        batch.bytes,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        sources: batch.sources,
        documents: documents.len(),
        removed,
        bytes: batch.bytes,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Attach embeddings to documents, batching provider calls.
async fn embed_documents(
    provider: &dyn EmbeddingProvider,
    mut documents: Vec<Document>,
) -> AppResult<Vec<Document>> {
    for chunk in documents.chunks_mut(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|d| d.content.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;

        if embeddings.len() != chunk.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                chunk.len()
            )));
        }

        for (document, embedding) in chunk.iter_mut().zip(embeddings) {
            document.embedding = embedding;
        }
    }

    tracing::debug!(
        "Embedded {} documents with {}/{}",
        documents.len(),
        provider.provider_name(),
        provider.model_name()
    );

    Ok(documents)
}

/// Return the `k` stored chunks nearest to `text`, most similar first.
///
/// `k` defaults to the store's configured `top_k`.
pub async fn query(config: &KnowledgeConfig, text: &str, k: Option<usize>) -> AppResult<Vec<Document>> {
    if text.trim().is_empty() {
        return Err(AppError::Knowledge("Query text is empty".to_string()));
    }

    let k = k.unwrap_or(config.store.top_k);
    tracing::info!("Querying knowledge store (top {}): {}", k, text);

    let provider = create_provider(&config.embedding).await?;
    let query_embedding = provider.embed(text).await?;

    let store = FileVectorStore::new(config.store.clone());
    let results = store.similarity_search_k(&query_embedding, k)?;

    if let Some(top) = results.first().and_then(|d| d.score) {
        tracing::info!("Retrieved {} chunks (top score: {:.3})", results.len(), top);
    } else {
        tracing::info!("No chunks found");
    }

    Ok(results)
}

/// Remove every stored chunk of one source.
pub fn remove_source(config: &KnowledgeConfig, source_type: &str, source_name: &str) -> AppResult<usize> {
    let mut store = FileVectorStore::new(config.store.clone());
    store.delete_by_source(source_type, source_name)
}

pub fn stats(config: &KnowledgeConfig) -> AppResult<StoreStats> {
    FileVectorStore::new(config.store.clone()).stats()
}

pub fn sources(config: &KnowledgeConfig) -> AppResult<Vec<SourceSummary>> {
    FileVectorStore::new(config.store.clone()).sources()
}

/// Empty the store.
pub fn clean(config: &KnowledgeConfig) -> AppResult<()> {
    tracing::info!("Cleaning knowledge store");
    FileVectorStore::new(config.store.clone()).clear()
}
