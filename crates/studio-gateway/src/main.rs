//! Studio Gateway: relays wizard requests to OpenRouter and serves the SPA shell.
//! The upstream key stays in the gateway; the browser never sees it.

use std::path::Path;
use std::sync::Arc;

use studio_core::{OpenRouterRelay, PromptComposer, PromptTemplates};
use studio_gateway::{build_app, AppState, GatewayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[studio-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config load failed: {}", e);
            std::process::exit(1);
        }
    };

    let templates = match PromptTemplates::load(config.prompts_path.as_deref().map(Path::new)) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("prompt templates failed to load: {}", e);
            std::process::exit(1);
        }
    };

    let relay = OpenRouterRelay::new(config.api_key.clone())
        .with_endpoint(config.upstream_url.clone())
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
        .with_attribution(config.referer.clone(), config.app_title.clone());

    if !config.api_key_present() {
        tracing::warn!("OPENROUTER_API_KEY not set; relay endpoints will answer 500 until it is configured");
    }

    let addr = config.bind_addr();
    tracing::info!(
        model = %config.model,
        public_dir = %config.resolved_public_dir().display(),
        api_key = if config.api_key_present() { "Set" } else { "Not set" },
        "studio gateway starting"
    );

    let app = build_app(AppState::new(config, PromptComposer::new(templates), Arc::new(relay)));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Health: http://{}/health", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {}", e);
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
