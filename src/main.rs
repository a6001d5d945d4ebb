mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clipd_core::config::RuntimeConfig;

#[derive(Parser)]
#[command(name = "clipd", version, about = "Clipboard history daemon with a picker-friendly CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the clipboard watcher in the foreground
    Daemon,
    /// List history, most recent first
    List {
        /// Print payloads only, one entry per line, newlines escaped (for pickers)
        #[arg(short, long)]
        simple: bool,
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<i64>,
        /// Do not truncate long payloads
        #[arg(short, long)]
        full: bool,
    },
    /// Restore an entry to the system clipboard
    Recall {
        /// Entry id; without it the selection is read from stdin
        id: Option<i64>,
    },
    /// Delete one entry
    Delete {
        /// Entry id; without it the selection is read from stdin
        id: Option<i64>,
    },
    /// Delete all entries and cached image data
    Clear {
        /// Only delete entries whose payload contains this text
        pattern: Option<String>,
    },
    /// Report whether the daemon is running
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Log to stderr so `list` output stays pipeable into pickers.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = RuntimeConfig::load()?;

    match cli.command {
        Commands::Daemon => commands::daemon::run(config).await,
        Commands::List {
            simple,
            limit,
            full,
        } => {
            commands::list::run(&config, simple, limit, full)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Recall { id } => {
            commands::recall::run(&config, id)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delete { id } => {
            commands::delete::run(&config, id)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clear { pattern } => {
            commands::clear::run(&config, pattern)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => commands::status::run(&config),
    }
}
