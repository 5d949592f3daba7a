// src/docs/gateway.rs
// =============================================================================
// The text generation service we send prompts to.
//
// - TextGateway: the trait the rest of the program depends on
// - AnthropicGateway: the live implementation (Anthropic Messages API)
// - generate_or_notice: turns any failure into a readable message, so a
//   failed generation never aborts a listing or an export
// =============================================================================

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Token budget for one generated document
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Why a generation failed
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no API key configured (set ANTHROPIC_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("the model returned an empty response")]
    Empty,
}

/// A prompt plus the model that should answer it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Future returned by [`TextGateway::generate`]
pub type GatewayFuture<'a> = BoxFuture<'a, Result<String, GatewayError>>;

/// Sends prompts to a text generation service
pub trait TextGateway: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GatewayFuture<'a>;
}

// Generates text, or explains in the returned text why it could not
//
// The surrounding flow keeps going either way.
pub async fn generate_or_notice(gateway: &dyn TextGateway, request: &GenerationRequest) -> String {
    match gateway.generate(request).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => failure_notice(&GatewayError::Empty),
        Err(e) => {
            warn!(error = %e, "text generation failed");
            failure_notice(&e)
        }
    }
}

fn failure_notice(error: &GatewayError) -> String {
    format!("⚠️ Documentation could not be generated: {}", error)
}

/// Live gateway that calls the Anthropic Messages API
pub struct AnthropicGateway {
    client: Client,
    api_key: Option<String>,
}

impl AnthropicGateway {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self { client, api_key })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl TextGateway for AnthropicGateway {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GatewayFuture<'a> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

            let body = MessagesRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                messages: [Message {
                    role: "user",
                    content: &request.prompt,
                }],
            };

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            if !status.is_success() {
                let message = serde_json::from_str::<ErrorResponse>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: MessagesResponse =
                serde_json::from_str(&text).map_err(|_| GatewayError::Empty)?;
            let output: String = parsed.content.into_iter().map(|b| b.text).collect();

            if output.trim().is_empty() {
                return Err(GatewayError::Empty);
            }
            Ok(output)
        })
    }
}

// -----------------------------------------------------------------------------
// Test support: a gateway that answers without a network
// -----------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::CannedGateway;
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: DEFAULT_MODEL.to_string(),
            prompt: "Describe this".to_string(),
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let gateway = CannedGateway::replying("# Docs");
        assert_eq!(generate_or_notice(&gateway, &request()).await, "# Docs");
        assert_eq!(gateway.prompts(), vec!["Describe this".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_becomes_visible_text() {
        let gateway = CannedGateway::failing();
        let text = generate_or_notice(&gateway, &request()).await;
        assert!(text.starts_with("⚠️ Documentation could not be generated"));
        assert!(text.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_notice() {
        let gateway = CannedGateway::replying("   ");
        let text = generate_or_notice(&gateway, &request()).await;
        assert!(text.contains("empty response"));
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let gateway = AnthropicGateway::new(None).unwrap();
        let err = gateway.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingApiKey));
    }
}
