//! Anthropic Claude provider implementation.
//!
//! Structured output is obtained by forcing a single tool call whose input
//! schema is the requested schema.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::LlmProvider;
use crate::AiError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
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

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<serde_json::Value>,
    tools: Vec<serde_json::Value>,
    tool_choice: serde_json::Value,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// Anthropic API error response.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Returns the input of the tool call named `tool`.
fn tool_input(response: AnthropicResponse, tool: &str) -> Result<serde_json::Value, AiError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            AnthropicContentBlock::ToolUse { name, input } if name == tool => Some(input),
            _ => None,
        })
        .ok_or_else(|| AiError::MalformedOutput {
            message: format!("Claude did not call the {tool} tool"),
        })
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate_structured(
        &self,
        system_prompt: &str,
        content: &str,
        schema_name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, AiError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: 8192,
            system: system_prompt,
            messages: vec![json!({ "role": "user", "content": content })],
            tools: vec![json!({
                "name": schema_name,
                "description": "Record the structured analysis of the document.",
                "input_schema": schema,
            })],
            tool_choice: json!({ "type": "tool", "name": schema_name }),
        };

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: AnthropicError =
                serde_json::from_str(&body).unwrap_or_else(|_| AnthropicError {
                    error: AnthropicErrorDetail {
                        message: format!("HTTP {status}: {body}"),
                    },
                });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        let response: AnthropicResponse = serde_json::from_str(&body)?;
        tool_input(response, schema_name)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn forces_tool_call_and_returns_its_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "k"))
            .and(body_partial_json(json!({
                "tool_choice": { "type": "tool", "name": "analysis" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    { "type": "text", "text": "Segue a análise." },
                    { "type": "tool_use", "id": "t1", "name": "analysis", "input": { "resumo": "ok" } }
                ],
                "stop_reason": "tool_use"
            })))
            .mount(&server)
            .await;

        let provider =
            AnthropicProvider::new("k".to_owned(), "claude".to_owned()).with_base_url(server.uri());
        let value = provider
            .generate_structured("sys", "texto", "analysis", &json!({ "type": "object" }))
            .await
            .unwrap();

        assert_eq!(value, json!({ "resumo": "ok" }));
    }

    #[test]
    fn text_only_reply_is_malformed() {
        let response: AnthropicResponse = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "não sei" }]
        }))
        .unwrap();
        assert!(matches!(
            tool_input(response, "analysis"),
            Err(AiError::MalformedOutput { .. })
        ));
    }
}
