use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use super::index::require_persistent_index;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{create_embedder, create_index};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Text to search reviews for")]
    pub query: String,

    #[arg(long, short = 'k', help = "Number of reviews to return")]
    pub top_k: Option<u32>,
}

pub async fn handle_search(
    args: SearchArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    require_persistent_index(config, "search")?;

    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let top_k = args.top_k.unwrap_or(config.chat.top_k);
    if top_k == 0 {
        anyhow::bail!("top-k must be at least 1");
    }

    let formatter = get_formatter(format);
    let embedder = create_embedder(config)?;
    let index = create_index(config)?;

    let embed_start = Instant::now();
    let vector = embedder
        .embed(query)
        .await
        .context("failed to generate query embedding")?;
    let embed_ms = embed_start.elapsed().as_millis();

    let search_start = Instant::now();
    let matches = index
        .query(vector, top_k)
        .await
        .context("search failed")?;
    let search_ms = search_start.elapsed().as_millis();

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Top K: {top_k}");
        eprintln!("  Embedding: {embed_ms}ms");
        eprintln!("  Search: {search_ms}ms");
        eprintln!();
    }

    print!("{}", formatter.format_matches(query, &matches));
    Ok(())
}
