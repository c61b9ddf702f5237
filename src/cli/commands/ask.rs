//! Ask command: retrieval-augmented answers about professors.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::index::require_persistent_index;
use crate::cli::output::get_formatter;
use crate::models::{ChatMessage, Config, OPENAI_API_KEY_VAR, OutputFormat, require_env};
use crate::services::{Assistant, ChatClient, create_embedder, create_index};

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question to ask; appended to the history as the last user message
    pub question: Option<String>,

    /// JSON file with prior messages: [{"role": "user", "content": "..."}]
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Number of reviews to retrieve as context
    #[arg(long, short = 'k')]
    pub top_k: Option<u32>,

    /// Print the retrieved reviews after the answer
    #[arg(long)]
    pub show_sources: bool,
}

pub async fn handle_ask(
    args: AskArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    require_persistent_index(config, "ask")?;

    let mut history: Vec<ChatMessage> = match args.history {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read history {}", path.display()))?;
            serde_json::from_str(&content).context("failed to parse history")?
        }
        None => Vec::new(),
    };

    if let Some(question) = args.question.as_deref().map(str::trim) {
        if question.is_empty() {
            anyhow::bail!("question cannot be empty");
        }
        history.push(ChatMessage::user(question));
    }

    if history.is_empty() {
        anyhow::bail!("nothing to ask: pass a question or --history");
    }

    let top_k = args.top_k.unwrap_or(config.chat.top_k);
    if top_k == 0 {
        anyhow::bail!("top-k must be at least 1");
    }

    let embedder = create_embedder(config)?;
    let index = create_index(config)?;
    let chat = ChatClient::new(
        &config.chat,
        require_env(OPENAI_API_KEY_VAR)?,
        config.retry.policy(),
    )?;

    if verbose {
        eprintln!(
            "Model: {} | Top K: {} | Turns: {}",
            chat.model(),
            top_k,
            history.len()
        );
    }

    let assistant = Assistant::new(embedder.as_ref(), index.as_ref(), &chat, top_k);
    let mut stdout = std::io::stdout();
    let answer = assistant
        .answer(&history, &mut stdout)
        .await
        .context("failed to answer question")?;
    writeln!(stdout)?;

    if args.show_sources {
        let formatter = get_formatter(format);
        let question = history.last().map_or("", |m| m.content.as_str());
        println!();
        print!("{}", formatter.format_matches(question, &answer.matches));
    }

    Ok(())
}
