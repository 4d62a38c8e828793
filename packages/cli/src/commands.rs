//! Implementations shared by the subcommands and the interactive menu.

use std::path::{Path, PathBuf};

use voz_civica_ai::LegislationParser;
use voz_civica_cli_utils::{IndicatifProgress, MultiProgress};
use voz_civica_project_models::LegislationAnalysis;
use voz_civica_scraper::ScraperConfig;
use voz_civica_scraper::pipeline::{AnalyzerError, DocumentAnalyzer, RunSummary};

/// Scrape settings given on the command line.
#[derive(Debug, Default)]
pub struct ScrapeOverrides {
    pub config: Option<PathBuf>,
    pub limit: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub base_url: Option<String>,
}

impl ScrapeOverrides {
    /// Loads the config file (or defaults) and applies the overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn resolve(&self) -> Result<ScraperConfig, voz_civica_scraper::ScrapeError> {
        let mut config = match &self.config {
            Some(path) => ScraperConfig::load(path)?,
            None => ScraperConfig::default(),
        };

        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(url) = &self.base_url {
            config.base_url.clone_from(url);
        }

        Ok(config)
    }
}

/// Feeds downloaded PDFs to the legislation parser.
struct LlmAnalyzer {
    parser: LegislationParser,
}

#[async_trait::async_trait]
impl DocumentAnalyzer for LlmAnalyzer {
    async fn analyze(&self, pdf_path: &Path) -> Result<LegislationAnalysis, AnalyzerError> {
        Ok(self.parser.parse(pdf_path).await?)
    }
}

/// Runs a scrape and prints the summary.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, the legislation
/// parser cannot be set up, or the output cannot be written.
pub async fn scrape(
    multi: &MultiProgress,
    overrides: &ScrapeOverrides,
    analyze: bool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let config = overrides.resolve()?;
    log::info!(
        "Scraping up to {} {} project(s) from {} into {}",
        config.limit,
        config.project_type,
        config.base_url,
        config.output_dir.display()
    );

    let analyzer = if analyze {
        Some(LlmAnalyzer {
            parser: LegislationParser::new(None)?,
        })
    } else {
        None
    };

    let progress = IndicatifProgress::projects_bar(multi, "Searching...");
    let summary = voz_civica_scraper::pipeline::run(
        &config,
        analyzer.as_ref().map(|a| a as &dyn DocumentAnalyzer),
        &progress,
    )
    .await?;

    println!();
    println!("Links found:        {}", summary.links_found);
    println!("Projects recorded:  {}", summary.projects_recorded);
    println!("Projects failed:    {}", summary.projects_failed);
    println!("Download failures:  {}", summary.document_failures);
    println!("Files downloaded:   {}", summary.files_downloaded);
    println!("Output:             {}", summary.output_path.display());

    Ok(summary)
}

/// Analyzes one PDF and writes the result to `out`.
///
/// # Errors
///
/// Returns an error if the parser cannot be set up, the analysis fails, or
/// `out` cannot be written.
pub async fn analyze(
    multi: &MultiProgress,
    file: &Path,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let parser = LegislationParser::new(None)?;

    let spinner = voz_civica_cli_utils::spinner(multi, &format!("Analyzing {}", file.display()));
    let result = parser.parse(file).await;
    spinner.finish_and_clear();

    let analysis = result?;
    write_analysis(&analysis, out)?;

    log::info!("Analysis saved to {}", out.display());
    Ok(())
}

/// Writes an analysis as pretty-printed UTF-8 JSON.
fn write_analysis(analysis: &LegislationAnalysis, out: &Path) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(analysis)?;
    std::fs::write(out, json)
}
