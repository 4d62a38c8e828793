//! LLM provider abstraction and implementations.
//!
//! Every provider turns a system prompt, a document and a JSON schema into
//! one JSON value, using whatever structured-output mechanism its API
//! offers.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::AiError;

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends `content` with `system_prompt` and asks for a reply matching
    /// `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the reply carries no
    /// JSON.
    async fn generate_structured(
        &self,
        system_prompt: &str,
        content: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, AiError>;
}

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Gemini,
    #[strum(to_string = "anthropic", serialize = "claude")]
    Anthropic,
    #[strum(to_string = "openai", serialize = "gpt")]
    OpenAi,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key.
    #[must_use]
    pub const fn api_key_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model used when `AI_MODEL` is not set.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-3-pro-preview",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

/// Everything needed to build a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Which backend to call.
    pub kind: ProviderKind,
    /// Credential sent with every request.
    pub api_key: String,
    /// Model identifier passed to the backend.
    pub model: String,
    /// Overrides the provider's API root (`AI_BASE_URL`).
    pub base_url: Option<String>,
}

impl ProviderSettings {
    /// Resolves settings from an explicit key and an environment lookup.
    ///
    /// Reads `AI_PROVIDER` (default `gemini`), `AI_MODEL`, `AI_BASE_URL`
    /// and the provider's key variable. `api_key` wins over the variable.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the provider name is unknown or no
    /// API key is available.
    pub fn resolve(
        api_key: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AiError> {
        let kind = match lookup("AI_PROVIDER") {
            Some(name) => name.parse::<ProviderKind>().map_err(|_| AiError::Config {
                message: format!(
                    "Unknown AI provider: {name}. Use 'gemini', 'anthropic', or 'openai'."
                ),
            })?,
            None => ProviderKind::Gemini,
        };

        let api_key = api_key
            .filter(|key| !key.is_empty())
            .or_else(|| lookup(kind.api_key_var()).filter(|key| !key.is_empty()))
            .ok_or_else(|| AiError::Config {
                message: format!(
                    "{} must be set in the environment or passed as an argument",
                    kind.api_key_var()
                ),
            })?;

        let model = lookup("AI_MODEL").unwrap_or_else(|| kind.default_model().to_owned());

        Ok(Self {
            kind,
            api_key,
            model,
            base_url: lookup("AI_BASE_URL"),
        })
    }
}

/// Builds the provider described by `settings`.
#[must_use]
pub fn create_provider(settings: ProviderSettings) -> Box<dyn LlmProvider> {
    let ProviderSettings {
        kind,
        api_key,
        model,
        base_url,
    } = settings;

    match kind {
        ProviderKind::Gemini => {
            let provider = gemini::GeminiProvider::new(api_key, model);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        ProviderKind::Anthropic => {
            let provider = anthropic::AnthropicProvider::new(api_key, model);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        ProviderKind::OpenAi => {
            let provider = openai::OpenAiProvider::new(api_key, model);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
    }
}

/// Parses a JSON document out of model text, tolerating a Markdown code
/// fence around it.
pub(crate) fn parse_json_text(text: &str) -> Result<serde_json::Value, AiError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim);

    serde_json::from_str(unfenced).map_err(|e| AiError::MalformedOutput {
        message: format!("reply is not valid JSON: {e}"),
    })
}
