//! Interactive menu shown when no subcommand is given.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use voz_civica_cli_utils::MultiProgress;
use voz_civica_scraper::ScraperConfig;

use crate::commands::{self, ScrapeOverrides};

/// Top-level actions available in the interactive menu.
enum Action {
    Scrape,
    Analyze,
}

impl Action {
    const ALL: &[Self] = &[Self::Scrape, Self::Analyze];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Scrape PLL bills",
            Self::Analyze => "Analyze a bill PDF",
        }
    }
}

/// Prompts for an action and its settings, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Voz Cívica");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Scrape => scrape(multi).await?,
        Action::Analyze => analyze(multi).await?,
    }

    Ok(())
}

async fn scrape(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = ScraperConfig::default();

    let limit: usize = Input::new()
        .with_prompt("Number of projects")
        .default(defaults.limit)
        .interact_text()?;
    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default(defaults.output_dir.display().to_string())
        .interact_text()?;
    let analyze = Confirm::new()
        .with_prompt("Analyze downloaded PDFs with the LLM?")
        .default(false)
        .interact()?;

    let overrides = ScrapeOverrides {
        limit: Some(limit),
        output_dir: Some(PathBuf::from(output_dir)),
        ..ScrapeOverrides::default()
    };
    commands::scrape(multi, &overrides, analyze).await?;

    Ok(())
}

async fn analyze(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let file: String = Input::new().with_prompt("PDF file").interact_text()?;
    let out: String = Input::new()
        .with_prompt("Output JSON path")
        .default("analysis.json".to_owned())
        .interact_text()?;

    commands::analyze(multi, &PathBuf::from(file), &PathBuf::from(out)).await
}
