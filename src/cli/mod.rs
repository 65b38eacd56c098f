//! CLI module
//!
//! Provides subcommands:
//! - `ask`: answer one question from the terminal
//! - `serve`: run the HTTP API

pub mod ask;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Evidence RAG - adaptive multi-pass retrieval over an evidence corpus
#[derive(Parser)]
#[command(name = "evidence-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a single question and print the decision trace
    Ask(ask::AskArgs),

    /// Run the HTTP API server
    Serve,
}

/// Load `.env` and the layered configuration, then install logging
fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
