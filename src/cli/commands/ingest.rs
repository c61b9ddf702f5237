//! Ingest command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{create_embedder, create_index, ingest};
use crate::sources::{DEFAULT_REVIEWS_PATH, read_reviews};

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to the reviews JSON file (use - for stdin)
    #[arg(default_value = DEFAULT_REVIEWS_PATH)]
    pub file: PathBuf,

    /// Assume the index already exists
    #[arg(long)]
    pub skip_create: bool,

    /// Only parse and validate the reviews file
    #[arg(long)]
    pub validate_only: bool,
}

pub async fn handle_ingest(
    args: IngestArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);

    let reviews = read_reviews(&args.file)
        .with_context(|| format!("failed to load reviews from {}", args.file.display()))?;

    if reviews.is_empty() {
        print!("{}", formatter.format_message("No reviews found in input."));
        return Ok(());
    }

    if verbose || args.validate_only {
        eprintln!("Found {} reviews in {}", reviews.len(), args.file.display());
    }

    if args.validate_only {
        print!(
            "{}",
            formatter.format_message(&format!(
                "Validation successful: {} reviews ready for ingestion",
                reviews.len()
            ))
        );
        return Ok(());
    }

    let embedder = create_embedder(config)?;
    let index = create_index(config)?;

    if !args.skip_create {
        let provisioned = index
            .ensure_index()
            .await
            .context("failed to provision index")?;
        if verbose {
            eprint!("{}", formatter.format_provisioned(index.name(), provisioned));
        }
    }

    let pb = ProgressBar::new(reviews.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let result = ingest(reviews, embedder.as_ref(), index.as_ref(), |review| {
        pb.set_message(review.professor.clone());
        pb.inc(1);
    })
    .await;
    pb.finish_and_clear();

    let report = result.context("ingestion failed")?;
    print!("{}", formatter.format_ingest_report(&report));

    Ok(())
}
