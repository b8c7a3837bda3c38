//! spanlogctl: Command-line inspector for spanlog summary files.
//!
//! Reads the lines written by the spanlog sink writer and reports them per
//! key or record by record.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spanlog::SinkFormat;
use std::path::PathBuf;

/// Command-line inspector for spanlog summary files.
#[derive(Parser)]
#[command(name = "spanlogctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Format of the summary file (csv, json)
    #[arg(short, long, env = "SPANLOG_FORMAT", default_value = "csv")]
    format: SinkFormat,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Totals per operation key
    Keys {
        /// Summary file written by spanlog
        #[arg(env = "SPANLOG_OUTPUT", default_value = "log.csv")]
        file: PathBuf,
    },
    /// List summary records
    Show {
        /// Summary file written by spanlog
        #[arg(env = "SPANLOG_OUTPUT", default_value = "log.csv")]
        file: PathBuf,
        /// Only show records for this key
        #[arg(short, long)]
        key: Option<String>,
        /// Show only the last N matching records (0 = all)
        #[arg(short = 'n', long, default_value = "0")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keys { file } => commands::keys::run(&file, cli.format, cli.output)?,
        Commands::Show { file, key, limit } => {
            commands::show::run(&file, cli.format, key.as_deref(), limit, cli.output)?;
        }
    }

    Ok(())
}
