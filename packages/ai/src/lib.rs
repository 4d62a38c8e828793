#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Semantic analysis of bill PDFs through an LLM provider.
//!
//! [`LegislationParser`] extracts the text of a bill, sends it with a fixed
//! system prompt and a JSON schema, and deserializes the structured reply
//! into a [`LegislationAnalysis`](voz_civica_project_models::LegislationAnalysis).
//! Gemini is the default provider; Anthropic Claude and `OpenAI` are
//! selectable through `AI_PROVIDER`.

pub mod legislation;
pub mod providers;

pub use legislation::{LegislationParser, SYSTEM_PROMPT, legislation_schema};

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bill text could not be extracted.
    #[error("PDF error: {0}")]
    Pdf(#[from] voz_civica_pdf::PdfError),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// The model replied with something that does not fit the schema.
    #[error("Malformed model output: {message}")]
    MalformedOutput {
        /// Description of what was wrong with the reply.
        message: String,
    },
}
