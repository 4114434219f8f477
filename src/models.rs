//! Core data models.
//!
//! These types flow from the loader through the chunker and index into the
//! answer pipeline, and finally out over HTTP as an [`AnswerResponse`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A loaded source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    /// Path relative to the content root, `/`-separated.
    pub source_id: String,
}

/// A bounded window of a document's content; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source_id: String,
}

/// A retrieval hit together with its cosine similarity.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeLink {
    pub label: String,
    pub url: String,
}

/// Fixed truth values that are never retrieved, only passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFacts {
    pub email: String,
    pub phone: String,
    pub resumes: Vec<ResumeLink>,
    pub schedule_url: String,
}

/// The response to one chat message.
///
/// `sources` is a set; it serializes as a sorted JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: BTreeSet<String>,
    pub resumes: Vec<ResumeLink>,
    pub schedule: String,
}
