//! Studio gateway: relay endpoints in front of the OpenRouter chat-completions API.

pub mod config;
pub mod error;
pub mod routes;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::{build_app, AppState};
