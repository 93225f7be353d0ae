//! Relay client: one POST to the OpenRouter chat-completions endpoint per call.
//! No retry, no timeout, no streaming: the first choice's text comes back or the call fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::types::UpstreamMessage;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Seam between the HTTP surface and the upstream provider; tests swap in stubs.
#[async_trait]
pub trait CompletionRelay: Send + Sync {
    async fn complete(&self, messages: &[UpstreamMessage], model: &str) -> Result<String, RelayError>;

    /// Whether a credential is configured. Reported by `/health`.
    fn has_credential(&self) -> bool;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [UpstreamMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Pulls the first completion's text out of a chat-completions body.
pub fn extract_content(body: &str) -> Result<String, RelayError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| RelayError::MalformedResponse("no completion choice in response".to_string()))
}

pub struct OpenRouterRelay {
    api_key: Option<String>,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
    referer: String,
    title: String,
    client: reqwest::Client,
}

impl OpenRouterRelay {
    /// Blank keys count as missing; the call then fails with a configuration error.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            endpoint: OPENROUTER_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            referer: "http://localhost".to_string(),
            title: "AI Image Generator".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// `HTTP-Referer` and `X-Title` headers OpenRouter uses for app attribution.
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionRelay for OpenRouterRelay {
    async fn complete(&self, messages: &[UpstreamMessage], model: &str) -> Result<String, RelayError> {
        let api_key = self.api_key.as_deref().ok_or(RelayError::Configuration)?;

        tracing::debug!(model, messages = messages.len(), "relay: calling upstream");

        let body = ChatRequest {
            model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "relay: upstream returned an error");
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        extract_content(&res.text().await?)
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "first");
    }

    #[test]
    fn empty_or_garbled_bodies_are_malformed() {
        for body in [r#"{"choices":[]}"#, r#"{"error":"x"}"#, "not json"] {
            assert!(matches!(
                extract_content(body),
                Err(RelayError::MalformedResponse(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        // Unroutable endpoint: reaching the network would surface as Transport instead.
        let relay = OpenRouterRelay::new(Some("   ".into())).with_endpoint("http://127.0.0.1:1/never");
        assert!(!relay.has_credential());
        let err = relay
            .complete(&[UpstreamMessage::user("hi")], DEFAULT_MODEL)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Configuration));
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }
}
