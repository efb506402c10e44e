//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};
use crate::llm::LlmConfig;

const PROVIDER: &str = "openai";

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

// ── Provider ────────────────────────────────────────────────────────────

/// Chat-completions provider for OpenAI-compatible APIs.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn wire_messages(messages: &[ChatMessage]) -> Vec<WireMessage<'_>> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: role_str(m.role),
                content: &m.content,
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: Self::wire_messages(&request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to send request: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => {
                    format!("API error ({}): {}", status.as_u16(), api_error.error.message)
                }
                Err(_) => format!("API error ({}): {}", status.as_u16(), error_text),
            };
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to parse response: {e}"),
            })?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "No content in response".to_string(),
            })?;

        let (input_tokens, output_tokens) = completion
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));
        debug!(input_tokens, output_tokens, "Completion finished");

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> LlmConfig {
        LlmConfig {
            api_key: SecretString::from("sk-test"),
            api_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn provider_constructs_and_reports_model() {
        // API keys are not validated at construction time; auth failures
        // surface on the first request.
        let provider = OpenAiProvider::new(&test_config()).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn request_body_skips_unset_options() {
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![WireMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: None,
            temperature: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn response_parses_without_usage() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Kenya"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Kenya")
        );
        assert!(parsed.usage.is_none());
    }

    #[test]
    fn api_error_parses() {
        let raw = r#"{"error":{"message":"quota exceeded","type":"insufficient_quota"}}"#;
        let parsed: ApiError = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.error.message, "quota exceeded");
    }
}
