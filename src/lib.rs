//! # Portfolio Agent
//!
//! A retrieval-augmented chat backend for a personal portfolio site.
//!
//! Markdown files describing the portfolio owner are chunked, embedded and
//! written to an on-disk vector index. A small HTTP API answers chat
//! messages by routing each question, retrieving the most relevant
//! passages, and asking a hosted language model to answer from them
//! together with a fixed set of canonical facts (email, phone, resume
//! links, scheduling link).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  content/   │──▶│ Chunk+Embed │──▶│ vector index │
//! │  *.md       │   │  (build)    │   │  (storage/)  │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//!                 ┌──────────────────────────┤
//!                 ▼                          ▼
//!          ┌────────────┐  question   ┌────────────┐
//!          │ HTTP /chat │────────────▶│ Assistant  │──▶ chat model
//!          └────────────┘             └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! agent build                        # index content/*.md
//! agent retrieve "certifications"    # inspect retrieval
//! agent ask "Who is Somesh?"         # one-off answer
//! agent serve                        # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Core data types |
//! | [`loader`] | Markdown document loader |
//! | [`chunk`] | Overlapping text chunker |
//! | [`embedding`] | Embedding client abstraction |
//! | [`index`] | On-disk vector index and retriever |
//! | [`generation`] | Chat-completion client abstraction |
//! | [`canon`] | Canonical facts from configuration |
//! | [`router`] | Question intent routing and source bias |
//! | [`prompt`] | System prompt and context formatting |
//! | [`assistant`] | The answer pipeline |
//! | [`ingest`] | Index build pipeline |
//! | [`server`] | HTTP API server |

pub mod assistant;
pub mod canon;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod prompt;
pub mod router;
pub mod server;
