//! CLI command implementations

pub mod ask;
pub mod config;
pub mod serve;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use finsight_core::config::Config;
use finsight_core::{FinsightContext, InsightRequest, Transaction};
use serde::Deserialize;

/// Get the finsight directory from environment or default
pub fn get_finsight_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINSIGHT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".finsight"))
        .context("Could not find home directory; set FINSIGHT_DIR")
}

/// Load configuration from the finsight directory and environment
pub fn load_config() -> Result<Config> {
    let finsight_dir = get_finsight_dir()?;
    Config::load(&finsight_dir)
}

/// Build the context, surfacing configuration problems as CLI errors
pub fn get_context(config: Config) -> Result<FinsightContext> {
    FinsightContext::new(config).context("Failed to initialize finsight")
}

/// Tokio runtime for the async commands
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Request file contents: a full request or just the transactions
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Request(InsightRequest),
    Transactions(Vec<Transaction>),
}

/// Read an insight request from a JSON file
pub fn read_request(path: &Path) -> Result<InsightRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: RequestFile = serde_json::from_str(&content)
        .with_context(|| format!("{} is neither a request object nor a transaction array", path.display()))?;

    Ok(match parsed {
        RequestFile::Request(request) => request,
        RequestFile::Transactions(transactions) => InsightRequest {
            transactions,
            ..Default::default()
        },
    })
}
