//! Scraper configuration.
//!
//! Every field has a default matching the live site, so an empty TOML file
//! (or no file at all) yields a working configuration. The CLI overrides
//! individual fields from flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::ScrapeError;

/// Root of the city council website.
pub const DEFAULT_BASE_URL: &str = "https://www.camarapoa.rs.gov.br";

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; VozCivicaBot/0.1; +https://github.com/mdfguerra)";

/// `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for a scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root that relative links are resolved against.
    pub base_url: String,
    /// Path of the project search page, relative to [`Self::base_url`].
    pub search_path: String,
    /// Value of the `by_tipo` search filter.
    pub project_type: String,
    /// Text an anchor must contain to count as a project link.
    pub link_marker: String,
    /// Maximum number of projects processed per run.
    pub limit: usize,
    /// Directory receiving `pdfs/` and `projects.json`.
    pub output_dir: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// `Accept` header value.
    pub accept: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            search_path: "/processos".to_owned(),
            project_type: "PLL".to_owned(),
            link_marker: "PLL".to_owned(),
            limit: 3,
            output_dir: PathBuf::from("data"),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            accept: DEFAULT_ACCEPT.to_owned(),
        }
    }
}

impl ScraperConfig {
    /// Parses a configuration from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Toml`] if the text is not valid TOML for this
    /// structure.
    pub fn from_toml_str(text: &str) -> Result<Self, ScrapeError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Io`] if the file cannot be read or
    /// [`ScrapeError::Toml`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, ScrapeError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        log::debug!("Loaded scraper config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Parses [`Self::base_url`].
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Url`] if the base URL is malformed.
    pub fn base_url(&self) -> Result<Url, ScrapeError> {
        Ok(Url::parse(&self.base_url)?)
    }

    /// Absolute URL of the project search page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Url`] if the base URL or search path is
    /// malformed.
    pub fn search_url(&self) -> Result<Url, ScrapeError> {
        Ok(self.base_url()?.join(&self.search_path)?)
    }

    /// Query parameters submitted with the project search.
    #[must_use]
    pub fn search_query(&self) -> [(&str, &str); 3] {
        [
            ("utf8", "\u{2713}"),
            ("by_tipo", self.project_type.as_str()),
            ("commit", "Pesquisar"),
        ]
    }

    /// Directory that per-project PDF folders are created in.
    #[must_use]
    pub fn pdf_dir(&self) -> PathBuf {
        self.output_dir.join("pdfs")
    }

    /// Path of the aggregated JSON output.
    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join("projects.json")
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
