//! Persisted vector index and the retriever built on it.
//!
//! The index is a directory bundle:
//!
//! | File | Contents |
//! |------|----------|
//! | `index.json` | manifest: format version, model, dims, build time, checksum, chunks |
//! | `vectors.bin` | one row of little-endian `f32`s per chunk, in chunk order |
//!
//! The bundle is written once by the index builder and loaded read-only by
//! the server. Search is a brute-force cosine scan, which is plenty for a
//! corpus of a few markdown files.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{
    blob_to_vec, cosine_similarity, embed_query, vec_to_blob, Embedder, OpenAIEmbedder,
};
use crate::models::{Chunk, ScoredChunk};

const FORMAT_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "index.json";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Serialize, Deserialize)]
struct Manifest {
    version: u32,
    model: String,
    dims: usize,
    built_at: DateTime<Utc>,
    /// SHA-256 of `vectors.bin`, hex-encoded.
    checksum: String,
    chunks: Vec<Chunk>,
}

/// In-memory vector index: chunks and their embeddings, row-aligned.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model: String,
    dims: usize,
    built_at: DateTime<Utc>,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(model: impl Into<String>, dims: usize) -> Self {
        Self {
            model: model.into(),
            dims,
            built_at: Utc::now(),
            chunks: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Append a chunk and its embedding.
    pub fn push(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dims {
            bail!(
                "Embedding for {} has {} dims, index expects {}",
                chunk.source_id,
                vector.len(),
                self.dims
            );
        }
        self.chunks.push(chunk);
        self.vectors.push(vector);
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Top-`k` chunks by cosine similarity, most similar first. Ties keep
    /// insertion order; a NaN score ranks last.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let score = cosine_similarity(query_vec, v);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Write the bundle to `dir`, replacing any previous bundle.
    ///
    /// Files are staged in a sibling temp directory and moved into place, so
    /// a failure part-way never leaves a half-written bundle at `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let parent = match dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let blob: Vec<u8> = self.vectors.iter().flat_map(|v| vec_to_blob(v)).collect();

        let manifest = Manifest {
            version: FORMAT_VERSION,
            model: self.model.clone(),
            dims: self.dims,
            built_at: self.built_at,
            checksum: hex::encode(Sha256::digest(&blob)),
            chunks: self.chunks.clone(),
        };

        let staging = tempfile::Builder::new()
            .prefix(".index-staging")
            .tempdir_in(parent)?;
        std::fs::write(staging.path().join(VECTORS_FILE), &blob)?;
        std::fs::write(
            staging.path().join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )?;

        if dir.exists() {
            std::fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to remove old index at {}", dir.display()))?;
        }
        std::fs::rename(staging.path(), dir)
            .with_context(|| format!("Failed to move index into {}", dir.display()))?;

        Ok(())
    }

    /// Load and verify a bundle written by [`VectorIndex::save`].
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            bail!(
                "No vector index found at {}. Run `agent build` first.",
                dir.display()
            );
        }

        let manifest: Manifest = serde_json::from_slice(
            &std::fs::read(&manifest_path)
                .with_context(|| format!("Failed to read {}", manifest_path.display()))?,
        )
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        if manifest.version != FORMAT_VERSION {
            bail!(
                "Unsupported index format version {} (expected {}). Rebuild the index.",
                manifest.version,
                FORMAT_VERSION
            );
        }

        let blob = std::fs::read(dir.join(VECTORS_FILE))
            .with_context(|| format!("Failed to read vectors in {}", dir.display()))?;

        if hex::encode(Sha256::digest(&blob)) != manifest.checksum {
            bail!("Index vectors checksum mismatch in {}", dir.display());
        }

        let row_bytes = manifest.dims * 4;
        if manifest.dims == 0 || blob.len() != row_bytes * manifest.chunks.len() {
            bail!(
                "Index is corrupt: {} bytes of vectors for {} chunks of {} dims",
                blob.len(),
                manifest.chunks.len(),
                manifest.dims
            );
        }

        let vectors = blob.chunks_exact(row_bytes).map(blob_to_vec).collect();

        Ok(Self {
            model: manifest.model,
            dims: manifest.dims,
            built_at: manifest.built_at,
            chunks: manifest.chunks,
            vectors,
        })
    }
}

/// Source of relevance-ranked chunks for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The `k` chunks most relevant to `query`, most relevant first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>>;
}

/// [`Retriever`] that embeds the query and scans a loaded [`VectorIndex`].
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if embedder.dims() != index.dims() {
            bail!(
                "Embedding model '{}' produces {} dims but the index was built with '{}' ({} dims)",
                embedder.model_name(),
                embedder.dims(),
                index.model(),
                index.dims()
            );
        }
        if embedder.model_name() != index.model() {
            tracing::warn!(
                index_model = index.model(),
                query_model = embedder.model_name(),
                "query embedding model differs from index model"
            );
        }
        Ok(Self { index, embedder })
    }

    /// Like [`Retriever::retrieve`], keeping similarity scores.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = embed_query(self.embedder.as_ref(), query).await?;
        if query_vec.len() != self.index.dims() {
            bail!(
                "Query embedding has {} dims, index expects {}",
                query_vec.len(),
                self.index.dims()
            );
        }
        Ok(self.index.search(&query_vec, k))
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let hits = self.search(query, k).await?;
        tracing::debug!(query, hits = hits.len(), "retrieved chunks");
        Ok(hits.into_iter().map(|h| h.chunk).collect())
    }
}

/// CLI entry point: print the top `limit` hits for `query` with scores.
///
/// Useful for checking what the index returns before it reaches the model.
pub async fn run_retrieve(config: &Config, query: &str, limit: usize) -> Result<()> {
    let api_key = config.require_api_key()?;
    let index = VectorIndex::load(&config.index.path)?;
    let embedder = OpenAIEmbedder::new(&config.embedding, api_key)?;
    let retriever = IndexRetriever::new(Arc::new(index), Arc::new(embedder))?;

    let hits = retriever.search(query, limit).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.chunk.content.chars().take(200).collect();
        println!(
            "{}. [{:.4}] {}\n   {}\n",
            i + 1,
            hit.score,
            hit.chunk.source_id,
            preview.replace('\n', "\n   ")
        );
    }

    Ok(())
}
