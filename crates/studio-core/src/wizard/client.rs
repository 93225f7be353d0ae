//! Client side of the gateway API used by the wizard.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::WizardError;
use crate::wire::{
    BackgroundRequest, BackgroundResponse, ConceptRequest, ConceptResponse, ErrorBody, ImageRequest,
    ImageResponse,
};

#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn generate_concept(&self, req: &ConceptRequest) -> Result<ConceptResponse, WizardError>;
    async fn remove_background(&self, req: &BackgroundRequest) -> Result<BackgroundResponse, WizardError>;
    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, WizardError>;
}

/// reqwest client for a running gateway. Every failure is reported as
/// [`WizardError::Network`], preferring the gateway's `{error}` text over the status line.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req, Resp>(&self, endpoint: &str, body: &Req) -> Result<Resp, WizardError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| network(endpoint, e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("API error: {}", status.as_u16()));
            return Err(network(endpoint, message));
        }

        res.json::<Resp>()
            .await
            .map_err(|e| network(endpoint, e.to_string()))
    }
}

fn network(endpoint: &str, message: String) -> WizardError {
    tracing::error!(endpoint, %message, "API call failed");
    WizardError::Network(message)
}

#[async_trait]
impl StudioApi for GatewayClient {
    async fn generate_concept(&self, req: &ConceptRequest) -> Result<ConceptResponse, WizardError> {
        self.post_json("/api/generate-concept", req).await
    }

    async fn remove_background(&self, req: &BackgroundRequest) -> Result<BackgroundResponse, WizardError> {
        self.post_json("/api/remove-background", req).await
    }

    async fn generate_image(&self, req: &ImageRequest) -> Result<ImageResponse, WizardError> {
        self.post_json("/api/generate-image", req).await
    }
}
