//! The answer pipeline.
//!
//! [`Assistant::answer`] turns one question plus the [`CanonicalFacts`]
//! into one [`AnswerResponse`]:
//!
//! ```text
//! question ──▶ Intent::classify ──┬─▶ scripted answer (resume / schedule)
//!                                 │
//!                                 └─▶ RetrievalPlan ──▶ retrieve top-K
//!                                         │
//!                                         ▼
//!                                  source bias (fallback to unfiltered)
//!                                         │
//!                                         ▼
//!                               format_context ──▶ ChatModel ──▶ answer
//! ```
//!
//! The assistant keeps no per-call state and only shares read-only
//! collaborators, so one instance serves all requests concurrently.
//! Retrieval and generation errors are propagated unchanged.

use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{Config, RetrievalConfig};
use crate::embedding::OpenAIEmbedder;
use crate::generation::{ChatModel, OpenAIChat};
use crate::index::{IndexRetriever, Retriever, VectorIndex};
use crate::models::{AnswerResponse, CanonicalFacts};
use crate::prompt::{format_context, render_user_message, SYSTEM_PROMPT};
use crate::router::Intent;

/// Scripted reply for resume requests.
pub const RESUME_ANSWER: &str = "Here’s Somesh’s Cloud Engineer resume — you can download it below 👇. If you’d also like his Data/Analytics resume, just let me know!";

/// Scripted reply for scheduling requests.
pub const SCHEDULE_ANSWER: &str = "You can book a call with Somesh below 👇";

pub struct Assistant {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
    context_chars: usize,
}

impl Assistant {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn ChatModel>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            model,
            top_k: retrieval.top_k,
            context_chars: retrieval.context_chars,
        }
    }

    /// Wire up the OpenAI clients and the on-disk index.
    ///
    /// Fails if the credential is missing or the index cannot be loaded, so
    /// the server never starts in a state where every request would fail.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;

        let index = VectorIndex::load(&config.index.path)?;
        tracing::info!(
            path = %config.index.path.display(),
            chunks = index.len(),
            model = index.model(),
            built_at = %index.built_at(),
            "vector index loaded"
        );

        let embedder = OpenAIEmbedder::new(&config.embedding, api_key)?;
        let retriever = IndexRetriever::new(Arc::new(index), Arc::new(embedder))?;
        let model = OpenAIChat::new(&config.generation, api_key)?;
        tracing::info!(
            model = model.model_name(),
            temperature = config.generation.temperature,
            "chat model ready"
        );

        Ok(Self::new(
            Arc::new(retriever),
            Arc::new(model),
            &config.retrieval,
        ))
    }

    /// Identifier of the chat model answers are generated with.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn answer(&self, question: &str, canon: CanonicalFacts) -> Result<AnswerResponse> {
        let intent = Intent::classify(question);
        tracing::debug!(?intent, "classified question");

        if let Some(answer) = scripted_answer(intent) {
            return Ok(AnswerResponse {
                answer: answer.to_string(),
                sources: BTreeSet::new(),
                resumes: canon.resumes,
                schedule: canon.schedule_url,
            });
        }

        let Some(plan) = intent.retrieval_plan(question) else {
            bail!("no retrieval plan for {:?}", intent);
        };

        let retrieved = self.retriever.retrieve(&plan.query, self.top_k).await?;
        let retrieved_count = retrieved.len();
        let chunks = plan.apply(retrieved);
        tracing::debug!(
            query = %plan.query,
            filter = plan.source_filter.unwrap_or("none"),
            retrieved = retrieved_count,
            kept = chunks.len(),
            "retrieval complete"
        );

        let context = format_context(&chunks, self.context_chars);
        let user_message = render_user_message(question, &context, &canon);
        let answer = self.model.complete(SYSTEM_PROMPT, &user_message).await?;

        let sources = chunks.into_iter().map(|c| c.source_id).collect();

        Ok(AnswerResponse {
            answer,
            sources,
            resumes: canon.resumes,
            schedule: canon.schedule_url,
        })
    }
}

fn scripted_answer(intent: Intent) -> Option<&'static str> {
    if !intent.is_scripted() {
        return None;
    }
    match intent {
        Intent::Resume => Some(RESUME_ANSWER),
        Intent::Schedule => Some(SCHEDULE_ANSWER),
        Intent::Certifications
        | Intent::Contact
        | Intent::CurrentActivities
        | Intent::General => None,
    }
}

/// CLI entry point: answer one question and print the JSON response.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    let response = assistant
        .answer(question, CanonicalFacts::from_config(config))
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ResumeLink};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedRetriever {
        chunks: Vec<Chunk>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedRetriever {
        fn new(chunks: Vec<Chunk>) -> Self {
            Self {
                chunks,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.chunks.iter().take(k).cloned().collect())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Chunk>> {
            anyhow::bail!("index unavailable")
        }
    }

    /// Records the user message and echoes a fixed reply.
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        fn model_name(&self) -> &str {
            "recording"
        }
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            assert_eq!(system, SYSTEM_PROMPT);
            self.prompts.lock().unwrap().push(user.to_string());
            Ok("generated answer".to_string())
        }
    }

    fn chunk(source_id: &str, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source_id: source_id.to_string(),
        }
    }

    fn canon() -> CanonicalFacts {
        CanonicalFacts {
            email: "me@example.com".to_string(),
            phone: "+1-555".to_string(),
            resumes: vec![
                ResumeLink {
                    label: "Cloud Engineer".to_string(),
                    url: "http://h/resumes/Somesh-Cloud-Engineer.pdf".to_string(),
                },
                ResumeLink {
                    label: "Data/Analytics".to_string(),
                    url: "http://h/resumes/somesh-data-analytics.pdf".to_string(),
                },
            ],
            schedule_url: "https://cal/x".to_string(),
        }
    }

    fn corpus() -> Vec<Chunk> {
        vec![
            chunk("about.md", "Somesh is a cloud engineer."),
            chunk("certs.md", "AWS Solutions Architect Associate."),
            chunk("projects.md", "Built a RAG portfolio agent."),
            chunk("certs.md", "Google Cloud Associate Engineer."),
            chunk("contact.md", "Reach out by email."),
        ]
    }

    fn assistant(
        retriever: Arc<FixedRetriever>,
        model: Arc<RecordingModel>,
    ) -> Assistant {
        Assistant::new(retriever, model, &RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_resume_is_scripted() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever.clone(), model.clone());

        let resp = a.answer("Can I get your resume?", canon()).await.unwrap();
        assert_eq!(resp.answer, RESUME_ANSWER);
        assert!(resp.sources.is_empty());
        assert_eq!(resp.resumes, canon().resumes);
        assert_eq!(resp.schedule, "https://cal/x");
        assert!(retriever.queries.lock().unwrap().is_empty());
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_skips_failing_retrieval() {
        let a = Assistant::new(
            Arc::new(FailingRetriever),
            Arc::new(RecordingModel::new()),
            &RetrievalConfig::default(),
        );
        let resp = a.answer("RESUME please", canon()).await.unwrap();
        assert_eq!(resp.answer, RESUME_ANSWER);
    }

    #[test]
    fn test_model_name_comes_from_chat_model() {
        let a = assistant(
            Arc::new(FixedRetriever::new(corpus())),
            Arc::new(RecordingModel::new()),
        );
        assert_eq!(a.model_name(), "recording");
    }

    #[test]
    fn test_scripted_answer_follows_intent() {
        assert_eq!(scripted_answer(Intent::Resume), Some(RESUME_ANSWER));
        assert_eq!(scripted_answer(Intent::Schedule), Some(SCHEDULE_ANSWER));
        for intent in [
            Intent::Certifications,
            Intent::Contact,
            Intent::CurrentActivities,
            Intent::General,
        ] {
            assert_eq!(scripted_answer(intent), None);
            assert!(intent.retrieval_plan("q").is_some());
        }
    }

    #[tokio::test]
    async fn test_schedule_is_scripted() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever.clone(), model.clone());

        for q in ["Can we schedule a chat?", "Book a call", "Set up a meeting"] {
            let resp = a.answer(q, canon()).await.unwrap();
            assert_eq!(resp.answer, SCHEDULE_ANSWER);
            assert!(resp.sources.is_empty());
        }
        assert!(retriever.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_certifications_biased_to_certs() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever.clone(), model.clone());

        let resp = a
            .answer("What certifications does Somesh have?", canon())
            .await
            .unwrap();

        assert_eq!(resp.answer, "generated answer");
        assert_eq!(
            resp.sources.into_iter().collect::<Vec<_>>(),
            vec!["certs.md".to_string()]
        );
        assert_eq!(*retriever.queries.lock().unwrap(), vec!["certifications"]);

        let prompts = model.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("[1] certs.md\nAWS Solutions Architect Associate."));
        assert!(prompt.contains("[2] certs.md\nGoogle Cloud Associate Engineer."));
        assert!(!prompt.contains("about.md"));
        assert!(prompt.starts_with("Question: What certifications does Somesh have?"));
    }

    #[tokio::test]
    async fn test_bias_falls_back_when_source_missing() {
        let without_certs = vec![
            chunk("about.md", "Somesh is a cloud engineer."),
            chunk("projects.md", "Built a RAG portfolio agent."),
        ];
        let retriever = Arc::new(FixedRetriever::new(without_certs));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever, model.clone());

        let resp = a.answer("Any certifications?", canon()).await.unwrap();
        let sources: Vec<String> = resp.sources.into_iter().collect();
        assert_eq!(sources, vec!["about.md", "projects.md"]);
        assert!(model.prompts.lock().unwrap()[0].contains("[2] projects.md"));
    }

    #[tokio::test]
    async fn test_contact_and_now_queries() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever.clone(), model);

        let resp = a.answer("What's your email?", canon()).await.unwrap();
        assert_eq!(
            resp.sources.into_iter().collect::<Vec<_>>(),
            vec!["contact.md".to_string()]
        );

        a.answer("What are you doing right now?", canon())
            .await
            .unwrap();

        let queries = retriever.queries.lock().unwrap();
        assert_eq!(*queries, vec!["contact information", "current activities"]);
    }

    #[tokio::test]
    async fn test_general_question_uses_raw_query() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever.clone(), model.clone());

        let resp = a
            .answer("Tell me about your projects", canon())
            .await
            .unwrap();

        assert_eq!(
            *retriever.queries.lock().unwrap(),
            vec!["Tell me about your projects"]
        );
        let sources: Vec<String> = resp.sources.into_iter().collect();
        assert_eq!(sources, vec!["about.md", "certs.md", "contact.md", "projects.md"]);
    }

    #[tokio::test]
    async fn test_top_k_is_requested() {
        let many: Vec<Chunk> = (0..12)
            .map(|i| chunk(&format!("doc{:02}.md", i), "text"))
            .collect();
        let retriever = Arc::new(FixedRetriever::new(many));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever, model.clone());

        let resp = a.answer("Tell me everything", canon()).await.unwrap();
        assert_eq!(resp.sources.len(), 8);
        let prompts = model.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("[8] doc07.md"));
        assert!(!prompt.contains("[9]"));
    }

    #[tokio::test]
    async fn test_canonical_facts_reach_prompt() {
        let retriever = Arc::new(FixedRetriever::new(corpus()));
        let model = Arc::new(RecordingModel::new());
        let a = assistant(retriever, model.clone());

        a.answer("Who is Somesh?", canon()).await.unwrap();
        let prompts = model.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("email=me@example.com"));
        assert!(prompt.contains("Cloud Engineer: http://h/resumes/Somesh-Cloud-Engineer.pdf"));
        assert!(prompt.ends_with("schedule=https://cal/x"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let a = Assistant::new(
            Arc::new(FailingRetriever),
            Arc::new(RecordingModel::new()),
            &RetrievalConfig::default(),
        );
        let err = a.answer("Tell me about projects", canon()).await.unwrap_err();
        assert!(err.to_string().contains("index unavailable"));
    }
}
