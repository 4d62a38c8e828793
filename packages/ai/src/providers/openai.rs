//! `OpenAI` chat completions provider implementation.
//!
//! Works with any `OpenAI`-compatible server via `AI_BASE_URL`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{LlmProvider, parse_json_text};
use crate::AiError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
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
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<serde_json::Value>,
    response_format: serde_json::Value,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn message_content(response: OpenAiResponse) -> Result<String, AiError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AiError::MalformedOutput {
            message: "OpenAI returned no choices".to_owned(),
        })?;

    if let Some(refusal) = message.refusal {
        return Err(AiError::MalformedOutput {
            message: format!("model refused: {refusal}"),
        });
    }

    message.content.ok_or_else(|| AiError::MalformedOutput {
        message: "OpenAI returned an empty message".to_owned(),
    })
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate_structured(
        &self,
        system_prompt: &str,
        content: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, AiError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![
                json!({ "role": "system", "content": system_prompt }),
                json!({ "role": "user", "content": content }),
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": { "name": schema_name, "schema": schema },
            }),
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
            return Err(AiError::Provider { message });
        }

        let response: OpenAiResponse = serde_json::from_str(&body)?;
        parse_json_text(&message_content(response)?)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_json_schema_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer k"))
            .and(body_partial_json(json!({
                "response_format": { "type": "json_schema", "json_schema": { "name": "analysis" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"resumo\":\"ok\"}" } }]
            })))
            .mount(&server)
            .await;

        let provider =
            OpenAiProvider::new("k".to_owned(), "gpt-4o".to_owned()).with_base_url(server.uri());
        let value = provider
            .generate_structured("sys", "texto", "analysis", &json!({ "type": "object" }))
            .await
            .unwrap();

        assert_eq!(value, json!({ "resumo": "ok" }));
    }

    #[test]
    fn refusal_is_malformed() {
        let response: OpenAiResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "no" } }]
        }))
        .unwrap();
        assert!(matches!(
            message_content(response),
            Err(AiError::MalformedOutput { .. })
        ));
    }
}
