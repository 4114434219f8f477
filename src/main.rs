//! # Portfolio Agent CLI (`agent`)
//!
//! ## Usage
//!
//! ```bash
//! agent --config ./config/agent.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `agent build` | Rebuild the vector index from the content directory |
//! | `agent serve` | Start the HTTP API server |
//! | `agent ask "<question>"` | Answer one question and print the JSON response |
//! | `agent retrieve "<query>"` | Show the top retrieved chunks for a query |
//!
//! `OPENAI_API_KEY` must be set for every command. Logging goes to stderr
//! and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_agent::{assistant, config, index, ingest, server};

/// Portfolio Agent: a retrieval-augmented chat backend for a portfolio site.
#[derive(Parser)]
#[command(
    name = "agent",
    about = "Portfolio Agent: a retrieval-augmented chat backend for a portfolio site",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/agent.toml`. When the file does not exist the
    /// built-in defaults are used; environment variables override either.
    #[arg(long, global = true, default_value = "./config/agent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index.
    ///
    /// Loads every markdown file from the content directory, splits it into
    /// overlapping chunks, embeds them and replaces the on-disk index.
    Build,

    /// Start the HTTP API server.
    ///
    /// Loads the index and API clients first; exits with an error if either
    /// is unavailable.
    Serve,

    /// Answer a single question and print the response as JSON.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Show the chunks the index returns for a query.
    Retrieve {
        /// The retrieval query.
        query: String,

        /// Number of chunks to show.
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build => {
            ingest::run_build(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ask { question } => {
            assistant::run_ask(&cfg, &question).await?;
        }
        Commands::Retrieve { query, limit } => {
            index::run_retrieve(&cfg, &query, limit).await?;
        }
    }

    Ok(())
}
