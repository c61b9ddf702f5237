//! CLI module for the review ingestion tool.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::{Config, EmbeddingProvider, IndexDriver, OutputFormat};

/// Embed professor reviews into a Pinecone index and ask questions about them.
#[derive(Debug, Parser)]
#[command(name = "prof-rag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        short = 'p',
        global = true,
        help = "Embedding provider: openai or gemini"
    )]
    pub provider: Option<EmbeddingProvider>,

    #[arg(long, global = true, help = "Index name")]
    pub index: Option<String>,

    #[arg(long, short = 'n', global = true, help = "Index namespace")]
    pub namespace: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Use a process-local index instead of Pinecone"
    )]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(provider) = self.provider
            && provider != config.embedding.provider
        {
            // Pinned model settings belong to the previous provider.
            config.embedding.provider = provider;
            config.embedding.model = None;
            config.embedding.dimension = None;
            config.embedding.base_url = None;
        }
        if let Some(ref index) = self.index {
            config.index.name = index.clone();
        }
        if let Some(ref namespace) = self.namespace {
            config.index.namespace = namespace.clone();
        }
        if self.memory {
            config.index.driver = IndexDriver::Memory;
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Embed reviews and upsert them into the index
    Ingest(commands::IngestArgs),

    /// Create the index if it does not exist
    CreateIndex,

    /// Show index statistics
    Stats,

    /// Find the reviews closest to a query
    Search(commands::SearchArgs),

    /// Ask the assistant about professors, grounded on indexed reviews
    Ask(commands::AskArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_defaults() {
        let cli = Cli::try_parse_from(["prof-rag", "ingest"]).unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.file, std::path::PathBuf::from("reviews.json"));
                assert!(!args.skip_create);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "prof-rag", "search", "kind grader", "--provider", "gemini", "-f", "json",
        ])
        .unwrap();
        assert_eq!(cli.provider, Some(EmbeddingProvider::Gemini));
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_provider_override_clears_pins() {
        let cli = Cli::try_parse_from(["prof-rag", "--provider", "gemini", "--memory", "stats"])
            .unwrap();
        let mut config = Config::default();
        config.embedding.model = Some("text-embedding-3-large".to_string());
        config.embedding.dimension = Some(3072);

        cli.apply_overrides(&mut config);

        assert_eq!(config.embedding.model(), "text-embedding-004");
        assert_eq!(config.embedding.dimension(), 768);
        assert_eq!(config.index.driver, IndexDriver::Memory);
    }

    #[test]
    fn test_same_provider_keeps_pins() {
        let cli = Cli::try_parse_from(["prof-rag", "--provider", "openai", "stats"]).unwrap();
        let mut config = Config::default();
        config.embedding.dimension = Some(512);

        cli.apply_overrides(&mut config);

        assert_eq!(config.embedding.dimension(), 512);
    }

    #[test]
    fn test_namespace_override() {
        let cli =
            Cli::try_parse_from(["prof-rag", "stats", "--namespace", "fall", "--index", "reviews"])
                .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.index.namespace, "fall");
        assert_eq!(config.index.name, "reviews");
    }
}
