//! Google Gemini provider implementation.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{LlmProvider, parse_json_text};
use crate::AiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` API provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Points the provider at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: serde_json::Value,
    contents: serde_json::Value,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_json_schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Concatenates the text parts of the first candidate.
fn candidate_text(response: GeminiResponse) -> Result<String, AiError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AiError::MalformedOutput {
            message: "Gemini returned no candidates".to_owned(),
        })?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::MalformedOutput {
            message: format!(
                "Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(text)
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_structured(
        &self,
        system_prompt: &str,
        content: &str,
        _schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, AiError> {
        let request = GeminiRequest {
            system_instruction: json!({ "parts": [{ "text": system_prompt }] }),
            contents: json!([{ "role": "user", "parts": [{ "text": content }] }]),
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: schema,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        log::debug!("POST {url}");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
            return Err(AiError::Provider { message });
        }

        let response: GeminiResponse = serde_json::from_str(&body)?;
        parse_json_text(&candidate_text(response)?)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn requests_json_and_reads_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "k"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"resumo\":" }, { "text": " \"ok\"}" }] },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("k".to_owned(), "gemini-test".to_owned())
            .with_base_url(server.uri());
        let value = provider
            .generate_structured("sys", "texto", "schema", &json!({ "type": "object" }))
            .await
            .unwrap();

        assert_eq!(value, json!({ "resumo": "ok" }));
    }

    #[tokio::test]
    async fn surfaces_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid" }
            })))
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::new("bad".to_owned(), "m".to_owned()).with_base_url(server.uri());
        let err = provider
            .generate_structured("sys", "texto", "schema", &json!({}))
            .await
            .unwrap_err();

        match err {
            AiError::Provider { message } => assert_eq!(message, "API key not valid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_candidates_are_malformed() {
        let response: GeminiResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(
            candidate_text(response),
            Err(AiError::MalformedOutput { .. })
        ));

        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        match candidate_text(response) {
            Err(AiError::MalformedOutput { message }) => assert!(message.contains("SAFETY")),
            _ => panic!("expected malformed output"),
        }
    }
}
