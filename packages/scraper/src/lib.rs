#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scrape-and-normalize pipeline for the Porto Alegre city council site.
//!
//! The pipeline runs strictly one step at a time:
//!
//! 1. [`session::Session`] loads the search page once to pick up cookies
//!    and the CSRF token.
//! 2. [`listing`] turns the search results into project URLs.
//! 3. [`detail`] extracts metadata, tab flags and document links from
//!    each project page.
//! 4. [`documents`] streams every PDF to `<pdf_dir>/<project id>/`.
//! 5. [`aggregator::ResultAggregator`] collects the records and writes
//!    them out as one JSON array.
//!
//! Responses that arrive as Rails script responses are unwrapped by
//! [`normalize`] before any HTML parsing happens. [`pipeline::run`] ties
//! the steps together and isolates failures to the project they happen in.

pub mod aggregator;
pub mod config;
pub mod detail;
pub mod documents;
pub mod listing;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod session;

pub use config::ScraperConfig;
pub use session::Session;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Reading or writing a local file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the results failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configuration value is unusable.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// The project URL has no trailing path segment to use as an id.
    #[error("Project URL has an empty id segment: {url}")]
    EmptyProjectId {
        /// The offending project URL.
        url: String,
    },
}

impl ScrapeError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
