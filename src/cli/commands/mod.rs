//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod config_cmd;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "carlot")]
#[command(about = "Scrape vehicle listings from a classifieds site into JSON Lines")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listing pages and append records to the output file (default)
    Run {
        /// Stop after this page number (overrides crawl.max_pages)
        #[arg(short, long)]
        pages: Option<u32>,
        /// Output file (overrides output.path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start a browser, open a blank page, and shut it down again
    Check,

    /// Print the effective configuration
    Config {
        /// Output format: toml, json or yaml (yml)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command.unwrap_or(Commands::Run {
        pages: None,
        output: None,
    }) {
        Commands::Run { pages, output } => {
            run::cmd_run(config, pages, output, cli.verbose).await
        }
        Commands::Check => check::cmd_check(config, cli.verbose).await,
        Commands::Config { format } => config_cmd::cmd_config_show(&config, &format),
    }
}
