//! Error types for the studio core.

use thiserror::Error;

/// Failures of the single relay call to the upstream chat-completion provider.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("OpenRouter API key not configured. Please set OPENROUTER_API_KEY environment variable.")]
    Configuration,

    #[error("OpenRouter API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("OpenRouter request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OpenRouter response parse failed: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    /// Upstream HTTP status, when the provider answered with a non-success code.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            RelayError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt templates IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt templates parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Gallery IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gallery serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Gallery sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Gallery item {0} already exists")]
    DuplicateId(String),

    #[error("Gallery storage lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Unsupported image type: {0}. Use JPEG, PNG or WebP.")]
    UnsupportedType(String),

    #[error("Invalid image data URL")]
    InvalidDataUrl,

    #[error("Image read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced to the wizard user as notifications.
#[derive(Error, Debug)]
pub enum WizardError {
    /// A transition guard rejected the action (missing image, style or prompt).
    #[error("{0}")]
    Guard(String),

    /// Transport or HTTP failure talking to the gateway.
    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Gallery(#[from] GalleryError),

    #[error(transparent)]
    Image(#[from] ImageError),
}
