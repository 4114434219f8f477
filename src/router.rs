//! Question routing.
//!
//! Every incoming question is classified into an [`Intent`] by
//! case-insensitive substring matching. Scripted intents are answered
//! without retrieval; the rest map to a [`RetrievalPlan`] through a fixed
//! routing table. Source-biased plans narrow the retrieved chunks to one
//! document, falling back to the unfiltered set when nothing matches.

use crate::models::Chunk;

/// What a question is asking for. Variants are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Resume,
    Schedule,
    Certifications,
    Contact,
    CurrentActivities,
    General,
}

/// Keyword triggers per intent, in precedence order. `General` is the
/// fallthrough and has no triggers.
const TRIGGERS: &[(Intent, &[&str])] = &[
    (Intent::Resume, &["resume"]),
    (Intent::Schedule, &["schedule", "book a call", "meeting"]),
    (Intent::Certifications, &["certification", "certifications"]),
    (Intent::Contact, &["contact", "email", "phone"]),
    (
        Intent::CurrentActivities,
        &["doing right now", "current", "now"],
    ),
];

impl Intent {
    pub fn classify(question: &str) -> Self {
        let lowered = question.to_lowercase();
        TRIGGERS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::General)
    }

    /// Scripted intents are answered verbatim, skipping retrieval and
    /// generation.
    pub fn is_scripted(self) -> bool {
        matches!(self, Intent::Resume | Intent::Schedule)
    }

    /// The retrieval plan for this intent, or `None` for scripted intents.
    pub fn retrieval_plan(self, question: &str) -> Option<RetrievalPlan> {
        let plan = match self {
            Intent::Resume | Intent::Schedule => return None,
            Intent::Certifications => RetrievalPlan::biased("certifications", "certs.md"),
            Intent::Contact => RetrievalPlan::biased("contact information", "contact.md"),
            Intent::CurrentActivities => RetrievalPlan::biased("current activities", "now.md"),
            Intent::General => RetrievalPlan {
                query: question.to_string(),
                source_filter: None,
            },
        };
        Some(plan)
    }
}

/// Which query to run against the index and which source to favor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalPlan {
    pub query: String,
    /// Substring a chunk's `source_id` must contain to be kept.
    pub source_filter: Option<&'static str>,
}

impl RetrievalPlan {
    fn biased(query: &str, source: &'static str) -> Self {
        Self {
            query: query.to_string(),
            source_filter: Some(source),
        }
    }

    /// Apply this plan's source filter to retrieved chunks.
    pub fn apply(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        match self.source_filter {
            Some(filter) => prefer_source(chunks, filter),
            None => chunks,
        }
    }
}

/// Keep only chunks whose `source_id` contains `filter`, preserving rank
/// order. If none match, the input is returned unchanged: a bias filter
/// never empties the context.
pub fn prefer_source(chunks: Vec<Chunk>, filter: &str) -> Vec<Chunk> {
    if !chunks.iter().any(|c| c.source_id.contains(filter)) {
        return chunks;
    }
    chunks
        .into_iter()
        .filter(|c| c.source_id.contains(filter))
        .collect()
}
