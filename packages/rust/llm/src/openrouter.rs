//! OpenAI-compatible `chat/completions` client (OpenRouter by default).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use docaudit_shared::{DocAuditError, LlmConfig, Result};

use crate::LanguageModel;

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("docaudit/", env!("CARGO_PKG_VERSION"));

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from `POST /chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible completion API.
pub struct OpenRouterClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenRouterClient {
    /// Build a client from the `[llm]` config section and a resolved API key.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = chat_endpoint(&config.base_url)?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocAuditError::Model(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl LanguageModel for OpenRouterClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocAuditError::Model(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    DocAuditError::Model(format!("{}: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(DocAuditError::Model(format!("HTTP {status}: {snippet}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DocAuditError::Model(format!("malformed completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DocAuditError::Model("completion response has no content".into()))?;

        debug!(response_len = content.len(), "completion received");
        Ok(content)
    }
}

/// Resolve `{base_url}/chat/completions`, tolerating a missing trailing slash.
fn chat_endpoint(base_url: &str) -> Result<Url> {
    let normalized = format!("{}/", base_url.trim_end_matches('/'));
    let base = Url::parse(&normalized)
        .map_err(|e| DocAuditError::config(format!("invalid llm.base_url '{base_url}': {e}")))?;
    base.join("chat/completions")
        .map_err(|e| DocAuditError::config(format!("invalid llm.base_url '{base_url}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &wiremock::MockServer) -> LlmConfig {
        LlmConfig {
            base_url: format!("{}/api/v1", server.uri()),
            model: "test/model".into(),
            timeout_secs: 5,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let a = chat_endpoint("https://openrouter.ai/api/v1").unwrap();
        let b = chat_endpoint("https://openrouter.ai/api/v1/").unwrap();
        assert_eq!(a.as_str(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(a, b);
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(chat_endpoint("not a url").is_err());
    }

    #[test]
    fn request_serializes_correctly() {
        let req = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""model":"m""#));
        assert!(json.contains(r#""role":"user""#));
        assert!(json.contains(r#""content":"hi""#));
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/v1/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer secret"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "no errors found"}}]
                }),
            ))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config_for(&server), "secret").unwrap();
        let out = client.complete("check this").await.unwrap();
        assert_eq!(out, "no errors found");
    }

    #[tokio::test]
    async fn complete_surfaces_http_errors() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config_for(&server), "secret").unwrap();
        let err = client.complete("check this").await.unwrap_err();
        assert!(matches!(err, DocAuditError::Model(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn complete_rejects_empty_choices() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config_for(&server), "secret").unwrap();
        let err = client.complete("check this").await.unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[tokio::test]
    async fn complete_rejects_malformed_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config_for(&server), "secret").unwrap();
        let err = client.complete("check this").await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
