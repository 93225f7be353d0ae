//! Studio: Core library.
//! Prompt composer, OpenRouter relay, wizard session and the locally persisted gallery.

pub mod error;
pub mod gallery;
pub mod prompt;
pub mod relay;
pub mod types;
pub mod wire;
pub mod wizard;

pub use error::{GalleryError, ImageError, PromptError, RelayError, WizardError};
pub use gallery::{GalleryBackend, GalleryStore, JsonFileBackend, MemoryBackend, SledBackend, GALLERY_KEY};
pub use prompt::{ImagePrompt, PromptComposer, PromptTemplates};
pub use relay::{CompletionRelay, OpenRouterRelay, DEFAULT_MODEL, OPENROUTER_URL};
pub use types::{AspectRatio, GalleryItem, ImageMime, Role, Selection, UploadedImage, UpstreamMessage};
pub use wizard::{
    ConceptMode, GatewayClient, GenerationResult, Notification, NotificationLevel, Step, StudioApi,
    WizardConfig, WizardSession,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
