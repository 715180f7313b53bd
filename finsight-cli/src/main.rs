//! Finsight CLI - spending insights server and local summaries

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::summary::{GroupByArg, KindArg};
use commands::{ask, config, serve, summary};

/// Finsight - AI spending insights for your transactions
#[derive(Parser)]
#[command(name = "finsight", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides HOST / settings)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides PORT / settings)
        #[arg(long)]
        port: Option<u16>,
        /// Answer with canned replies instead of calling OpenAI
        #[arg(long)]
        demo: bool,
    },

    /// Group a transaction file by category, merchant or payment method
    Summary {
        /// JSON file: a request object or a bare transaction array
        file: PathBuf,
        /// Period to summarize (YYYYMM); defaults to the file's period
        #[arg(long)]
        period: Option<String>,
        /// Grouping key
        #[arg(long, value_enum, default_value = "category")]
        by: GroupByArg,
        /// Which transactions to include
        #[arg(long, value_enum, default_value = "expense")]
        kind: KindArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one insight or chat request from a file
    Ask {
        /// JSON file: a request object or a bare transaction array
        file: PathBuf,
        /// Period (YYYYMM); overrides the file's period
        #[arg(long)]
        period: Option<String>,
        /// Chat question; overrides the file's query
        #[arg(long, short)]
        query: Option<String>,
        /// Answer with canned replies instead of calling OpenAI
        #[arg(long)]
        demo: bool,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port, demo } => serve::run(host, port, demo),
        Commands::Summary { file, period, by, kind, json } => {
            summary::run(&file, period.as_deref(), by, kind, json)
        }
        Commands::Ask { file, period, query, demo } => ask::run(&file, period, query, demo),
        Commands::Config { json } => config::run(json),
    }
}
