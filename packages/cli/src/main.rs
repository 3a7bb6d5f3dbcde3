mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{classify, init, inspect, ClassifyArgs, InitArgs, InspectArgs};
use config::Config;
use std::path::PathBuf;

/// Folio CLI - inspect multi-tab documents and their initial content
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./folio.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a folio.config.json
    Init(InitArgs),

    /// Report the wire shape of initial-content files
    Classify(ClassifyArgs),

    /// Open initial content as a document and print its tabs
    Inspect(InspectArgs),
}

async fn run(cli: Cli, cwd: &str) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(cwd)?,
    };
    tracing::debug!(?config, "Loaded config");

    match cli.command {
        Command::Init(args) => init(args, cwd),
        Command::Classify(args) => classify(args, cwd),
        Command::Inspect(args) => inspect(args, &config).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => run(cli, &cwd.display().to_string()).await,
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
