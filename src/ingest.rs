//! Index build pipeline.
//!
//! Loads every document from the content directory, splits each into
//! overlapping chunks, embeds the chunks in batches and writes a fresh
//! [`VectorIndex`] bundle. The build is not incremental: each run replaces
//! the previous index entirely. An empty corpus aborts before anything is
//! written.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::chunk::chunk_document;
use crate::config::Config;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::index::VectorIndex;
use crate::loader::load_documents;
use crate::models::Chunk;

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks: usize,
    pub dims: usize,
}

/// CLI entry point: build with the OpenAI embedder and print a summary.
pub async fn run_build(config: &Config) -> Result<()> {
    let api_key = config.require_api_key()?;
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(&config.embedding, api_key)?);

    let stats = build_index(config, embedder.as_ref()).await?;

    println!("Index build complete:");
    println!("  documents: {}", stats.documents);
    println!("  chunks: {}", stats.chunks);
    println!("  dims: {}", stats.dims);
    println!("  path: {}", config.index.path.display());
    println!("ok");

    Ok(())
}

/// Build and save the index using `embedder`.
pub async fn build_index(config: &Config, embedder: &dyn Embedder) -> Result<BuildStats> {
    let docs = load_documents(&config.content)?;
    if docs.is_empty() {
        bail!(
            "No documents found in {}. Add some .md files before building the index.",
            config.content.root.display()
        );
    }
    tracing::info!(documents = docs.len(), "loaded documents");

    let chunks: Vec<Chunk> = docs
        .iter()
        .flat_map(|doc| {
            chunk_document(
                doc,
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
            )
        })
        .collect();
    if chunks.is_empty() {
        bail!(
            "Every document in {} is empty. Add some content before building the index.",
            config.content.root.display()
        );
    }
    tracing::info!(chunks = chunks.len(), "split documents into chunks");

    let mut index = VectorIndex::new(embedder.model_name(), embedder.dims());

    for (batch_no, batch) in chunks.chunks(config.embedding.batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != batch.len() {
            bail!(
                "Embedder returned {} vectors for a batch of {}",
                vectors.len(),
                batch.len()
            );
        }
        for (chunk, vector) in batch.iter().cloned().zip(vectors) {
            index.push(chunk, vector)?;
        }
        tracing::debug!(batch = batch_no, size = batch.len(), "embedded batch");
    }

    index.save(&config.index.path)?;
    tracing::info!(path = %config.index.path.display(), "index saved");

    Ok(BuildStats {
        documents: docs.len(),
        chunks: index.len(),
        dims: index.dims(),
    })
}
