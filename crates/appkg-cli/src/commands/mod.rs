//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use appkg_graph::{BackendKind, CypherBackend, GraphBackend, GraphClient, GraphConfig, MemoryBackend};

use crate::config::{AppConfig, ConfigOverrides};

pub mod ask;
pub mod clean;
pub mod ingest;
pub mod schema;
pub mod status;

/// AppKG - App metadata knowledge graph
#[derive(Parser)]
#[command(name = "appkg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Config file (defaults to ./appkg.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Graph store and language model settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Bolt URI of the graph store
    #[arg(long, global = true, env = "APPKG_GRAPH_URI")]
    pub uri: Option<String>,

    /// Graph store user
    #[arg(long, global = true, env = "APPKG_GRAPH_USER")]
    pub user: Option<String>,

    /// Graph store password
    #[arg(long, global = true, env = "APPKG_GRAPH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database (Neo4j) or subgraph (TuGraph)
    #[arg(long, global = true, env = "APPKG_GRAPH_DATABASE")]
    pub database: Option<String>,

    /// Graph store kind: neo4j, tugraph, memory or memory-tugraph
    #[arg(long, global = true, env = "APPKG_BACKEND")]
    pub backend: Option<BackendKind>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, env = "APPKG_LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// API key for the language model
    #[arg(long, global = true, env = "APPKG_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Chat model name
    #[arg(long, global = true, env = "APPKG_LLM_MODEL")]
    pub llm_model: Option<String>,
}

impl From<ConnectionArgs> for ConfigOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            uri: args.uri,
            user: args.user,
            password: args.password,
            database: args.database,
            backend: args.backend,
            llm_base_url: args.llm_base_url,
            llm_api_key: args.llm_api_key,
            llm_model: args.llm_model,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV export into the graph
    Ingest(ingest::IngestArgs),

    /// Create constraints or labels on the graph store
    Schema,

    /// Prepare a raw export: drop incomplete and duplicate rows, add buckets
    Clean(clean::CleanArgs),

    /// Ask a question about the graph (interactive without --question)
    Ask(ask::AskArgs),

    /// Show node and relationship counts
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?.apply(self.connection.into());

        match self.command {
            Commands::Ingest(args) => ingest::execute(args, &config).await,
            Commands::Schema => schema::execute(&config).await,
            Commands::Clean(args) => clean::execute(args),
            Commands::Ask(args) => ask::execute(args, &config).await,
            Commands::Status => status::execute(&config).await,
        }
    }
}

/// Open the configured graph store.
///
/// The returned backend owns the connection; dropping it releases the
/// connection on every exit path.
pub async fn open_backend(config: &GraphConfig) -> Result<Box<dyn GraphBackend>> {
    match config.backend {
        kind if kind.is_memory() => {
            info!("Using in-memory graph, nothing will be persisted");
            Ok(Box::new(MemoryBackend::with_dialect(config.backend.dialect())))
        }
        kind => {
            let client = connect(config).await?;
            Ok(Box::new(CypherBackend::new(client, kind.dialect())))
        }
    }
}

/// Connect to the configured Bolt store.
pub async fn connect(config: &GraphConfig) -> Result<GraphClient> {
    GraphClient::connect(config)
        .await
        .with_context(|| format!("Failed to connect to {} at {}", config.backend, config.uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use appkg_graph::WriteMode;

    #[tokio::test]
    async fn test_memory_backends_follow_dialect_write_mode() {
        let mut config = GraphConfig::default();

        config.backend = BackendKind::Memory;
        let backend = open_backend(&config).await.unwrap();
        assert_eq!(backend.write_mode(), WriteMode::Bulk);

        config.backend = BackendKind::MemoryTuGraph;
        let backend = open_backend(&config).await.unwrap();
        assert_eq!(backend.write_mode(), WriteMode::PerRow);
    }
}
