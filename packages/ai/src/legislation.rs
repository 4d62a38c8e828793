//! Legislation parser: prompt, schema and the parse entry points.

use std::path::Path;

use serde_json::json;
use voz_civica_project_models::{Category, LegislationAnalysis};

use crate::AiError;
use crate::providers::{LlmProvider, ProviderSettings, create_provider};

/// Instructions sent as the system prompt of every analysis request.
pub const SYSTEM_PROMPT: &str = "Você é um analista legislativo e especialista em comunicação cívica.
Sua tarefa é analisar um Projeto de Lei (PL) e extrair metadados semânticos.
Analise o texto completo para extrair resumo, justificativa e evidências (XAI).";

/// Name under which the schema is registered with providers that need one.
pub const SCHEMA_NAME: &str = "legislation_analysis";

/// JSON schema the model output must satisfy.
#[must_use]
pub fn legislation_schema() -> serde_json::Value {
    let categories: Vec<String> = Category::ALL.iter().map(ToString::to_string).collect();

    json!({
        "type": "object",
        "properties": {
            "resumo": { "type": "string" },
            "justificativa": { "type": "string" },
            "evidencias": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "ponto_resumo": { "type": "string" },
                        "citacao_original": { "type": "string" },
                    },
                    "required": ["ponto_resumo", "citacao_original"],
                },
            },
            "categorias": {
                "type": "array",
                "items": { "type": "string", "enum": categories },
            },
        },
        "required": ["resumo", "justificativa", "evidencias", "categorias"],
    })
}

/// Extracts semantic metadata from bill PDFs.
pub struct LegislationParser {
    provider: Box<dyn LlmProvider>,
}

impl LegislationParser {
    /// Builds a parser from the environment.
    ///
    /// `api_key` takes precedence over the provider's key variable
    /// (`GEMINI_API_KEY` for the default provider).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the provider is unknown or no API key
    /// is available.
    pub fn new(api_key: Option<String>) -> Result<Self, AiError> {
        let settings = ProviderSettings::resolve(api_key, |name| std::env::var(name).ok())?;
        log::info!(
            "Using {} provider with model {}",
            settings.kind,
            settings.model
        );
        Ok(Self::with_provider(create_provider(settings)))
    }

    /// Wraps an already-built provider.
    #[must_use]
    pub fn with_provider(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Extracts the text of `pdf_path` and analyzes it.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the PDF cannot be read, the provider call
    /// fails, or the reply does not match the schema.
    pub async fn parse(&self, pdf_path: &Path) -> Result<LegislationAnalysis, AiError> {
        let text = voz_civica_pdf::extract_text(pdf_path).await?;
        log::info!(
            "Analyzing {} ({} characters)",
            pdf_path.display(),
            text.len()
        );
        self.parse_text(&text).await
    }

    /// Analyzes already-extracted bill text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the provider call fails or the reply does
    /// not match the schema.
    pub async fn parse_text(&self, text: &str) -> Result<LegislationAnalysis, AiError> {
        let schema = legislation_schema();
        let value = self
            .provider
            .generate_structured(SYSTEM_PROMPT, text, SCHEMA_NAME, &schema)
            .await?;

        analysis_from_value(value)
    }
}

/// Deserializes a model reply, reporting schema violations as
/// [`AiError::MalformedOutput`].
///
/// # Errors
///
/// Returns [`AiError::MalformedOutput`] if `value` does not describe a
/// [`LegislationAnalysis`].
pub fn analysis_from_value(value: serde_json::Value) -> Result<LegislationAnalysis, AiError> {
    serde_json::from_value(value).map_err(|e| AiError::MalformedOutput {
        message: e.to_string(),
    })
}
