#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for Voz Cívica.
//!
//! `scrape` collects PLL bills from the Porto Alegre city council site,
//! `analyze` runs the legislation parser on a single PDF. Without a
//! subcommand an interactive menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`voz_civica_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::ScrapeOverrides;

#[derive(Parser)]
#[command(name = "voz_civica", about = "Porto Alegre city council bill scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape PLL bills, download their PDFs and write projects.json
    Scrape {
        /// TOML file with scraper settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum number of projects to process
        #[arg(long)]
        limit: Option<usize>,
        /// Directory receiving pdfs/ and projects.json
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Site root (e.g. a local mirror)
        #[arg(long)]
        base_url: Option<String>,
        /// Run the legislation parser on every downloaded PDF
        #[arg(long)]
        analyze: bool,
    },
    /// Extract semantic metadata from a bill PDF
    Analyze {
        /// Path to the PDF file
        file: PathBuf,
        /// Output JSON path
        #[arg(long, default_value = "analysis.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = voz_civica_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Scrape {
            config,
            limit,
            output_dir,
            base_url,
            analyze,
        } => {
            let overrides = ScrapeOverrides {
                config,
                limit,
                output_dir,
                base_url,
            };
            commands::scrape(&multi, &overrides, analyze).await?;
        }
        Commands::Analyze { file, out } => {
            commands::analyze(&multi, &file, &out).await?;
        }
    }

    Ok(())
}
