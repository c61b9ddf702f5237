use anyhow::{Context, Result};

use crate::cli::output::get_formatter;
use crate::models::{Config, IndexDriver, OutputFormat};
use crate::services::create_index;

/// Read-side commands need an index that outlives the process.
pub(super) fn require_persistent_index(config: &Config, command: &str) -> Result<()> {
    if config.index.driver == IndexDriver::Memory {
        anyhow::bail!(
            "{command} cannot use --memory: the memory index only lives for a single command, \
             so there is nothing to query"
        );
    }
    Ok(())
}

pub async fn handle_create_index(config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let index = create_index(config)?;

    let provisioned = index
        .ensure_index()
        .await
        .with_context(|| format!("failed to provision index {}", index.name()))?;

    print!("{}", formatter.format_provisioned(index.name(), provisioned));
    Ok(())
}

pub async fn handle_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    if config.index.driver == IndexDriver::Memory {
        eprintln!("Hint: the memory index only lives for a single command; stats will be empty.");
    }

    let index = create_index(config)?;
    let stats = index
        .describe_stats()
        .await
        .context("failed to fetch index stats")?;

    print!("{}", formatter.format_stats(index.name(), &stats));
    Ok(())
}
