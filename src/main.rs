use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use prof_rag::cli::commands::{
    handle_ask, handle_config, handle_create_index, handle_ingest, handle_search, handle_stats,
};
use prof_rag::cli::output::get_formatter;
use prof_rag::cli::{Cli, Commands};
use prof_rag::models::{Config, OutputFormat};

const LOG_ENV: &str = "PROF_RAG_LOG";

/// Logs go to stderr so stdout stays clean for command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "prof_rag=debug" } else { "prof_rag=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; keys may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("failed to load config")?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let format = cli.format.unwrap_or(config.output.default_format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, &config, format, verbose) => {
            if let Err(error) = result {
                eprint!("{}", get_formatter(format).format_error(&format!("{error:#}")));
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, aborting.");
            std::process::exit(130);
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Ingest(args) => handle_ingest(args, config, format, verbose).await,
        Commands::CreateIndex => handle_create_index(config, format).await,
        Commands::Stats => handle_stats(config, format).await,
        Commands::Search(args) => handle_search(args, config, format, verbose).await,
        Commands::Ask(args) => handle_ask(args, config, format, verbose).await,
        Commands::Config(cmd) => handle_config(cmd, config, format).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
