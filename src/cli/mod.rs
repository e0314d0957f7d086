//! CLI parser and command dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::export::{ExportFormat, ExportTable};

#[derive(Parser)]
#[command(name = "siteaudit")]
#[command(about = "Content audit analytics backend")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch the dataset once and print a summary
    Fetch,

    /// Fetch and write one table to a file
    Export {
        /// Table to export
        #[arg(short, long, value_enum, default_value = "master")]
        table: ExportTable,
        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output path (defaults to siteaudit_<table>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            commands::serve::run(&settings, &host, port).await
        }
        Commands::Fetch => commands::fetch::run(&settings).await,
        Commands::Export {
            table,
            format,
            output,
        } => commands::export::run(&settings, table, format, output).await,
    }
}
