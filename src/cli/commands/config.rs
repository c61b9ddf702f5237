use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{
    Config, GEMINI_API_KEY_VAR, OPENAI_API_KEY_VAR, OutputFormat, PINECONE_API_KEY_VAR,
};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Show the configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(config, format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn key_status(var: &str) -> &'static str {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => "set",
        _ => "missing",
    }
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    let keys = [PINECONE_API_KEY_VAR, OPENAI_API_KEY_VAR, GEMINI_API_KEY_VAR];

    if format == OutputFormat::Json {
        let env: serde_json::Map<String, serde_json::Value> = keys
            .iter()
            .map(|var| (var.to_string(), key_status(var).into()))
            .collect();
        let output = serde_json::json!({
            "config": config,
            "resolved": {
                "embedding_model": config.embedding.model(),
                "embedding_dimension": config.embedding.dimension(),
                "embedding_url": config.embedding.base_url(),
            },
            "env": env,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path().filter(|p| p.exists()) {
        println!("# Config file: {}", path.display());
    } else {
        println!("# No config file, using defaults");
    }
    println!(
        "# Effective embedding model: {} ({} dimensions)",
        config.embedding.model(),
        config.embedding.dimension()
    );
    for var in keys {
        println!("# {var}: {}", key_status(var));
    }
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn handle_path() -> Result<()> {
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    let state = if path.exists() { "active" } else { "would be" };
    println!("Config file ({state}): {}", path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({state}): {}", env_path.display());
    }
    Ok(())
}
