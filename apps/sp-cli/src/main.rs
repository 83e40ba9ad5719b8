//! # sp-cli
//!
//! Operator CLI for SuitePilot.
//!
//! - `sp tools` — print the governed tool catalog
//! - `sp route <message>` — show how a message would be classified
//! - `sp audit verify/tail` — inspect a JSONL audit log

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SuitePilot operator CLI.
#[derive(Parser)]
#[command(name = "sp", version, about)]
struct Cli {
    /// Path to suitepilot.toml (defaults to ./suitepilot.toml).
    #[arg(long, default_value = "suitepilot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the governed tool catalog.
    Tools,
    /// Classify a message the way the coordinator would.
    Route {
        /// The user message to classify.
        message: String,
    },
    /// Inspect a JSONL audit log.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::CliConfig::load(&cli.config)?;

    match cli.command {
        Commands::Tools => commands::tools::run(),
        Commands::Route { message } => commands::route::run(&message),
        Commands::Audit { command } => commands::audit::run(command, &config),
    }
}
