//! HTTP surface: three relay endpoints, health probes and the SPA shell.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use studio_core::wire::{
    required, BackgroundRequest, BackgroundResponse, ConceptRequest, ConceptResponse, ImageRequest,
    ImageResponse,
};
use studio_core::{CompletionRelay, PromptComposer};

use crate::config::GatewayConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub composer: Arc<PromptComposer>,
    pub relay: Arc<dyn CompletionRelay>,
}

impl AppState {
    pub fn new(config: GatewayConfig, composer: PromptComposer, relay: Arc<dyn CompletionRelay>) -> Self {
        Self {
            config: Arc::new(config),
            composer: Arc::new(composer),
            relay,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let public_dir = state.config.resolved_public_dir();
    let spa = ServeDir::new(&public_dir).fallback(ServeFile::new(public_dir.join("index.html")));
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/api/generate-concept", post(generate_concept))
        .route("/api/remove-background", post(remove_background))
        .route("/api/generate-image", post(generate_image))
        .route("/api/test", get(api_test))
        .route("/health", get(health))
        .fallback_service(spa)
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// A request without a JSON content type reads as `{}` so it fails on the missing field.
/// Any other rejection becomes a JSON error body.
fn request_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// POST /api/generate-concept – detailed image prompt for a style, optional topic and ratio.
async fn generate_concept(
    State(state): State<AppState>,
    payload: Result<Json<ConceptRequest>, JsonRejection>,
) -> Result<Json<ConceptResponse>, ApiError> {
    let body = request_body(payload)?;
    let style = required(body.style.as_deref()).ok_or(ApiError::BadRequest("Style is required"))?;

    tracing::info!(style, topic = ?body.topic, aspect_ratio = ?body.aspect_ratio, "generating concept");
    let messages = state
        .composer
        .compose_concept(style, body.topic.as_deref(), body.aspect_ratio.as_deref());
    let concept = state.relay.complete(&messages, &state.config.model).await?;

    Ok(Json(ConceptResponse { concept }))
}

/// POST /api/remove-background – background analysis text; the image itself is not processed.
async fn remove_background(
    State(state): State<AppState>,
    payload: Result<Json<BackgroundRequest>, JsonRejection>,
) -> Result<Json<BackgroundResponse>, ApiError> {
    let body = request_body(payload)?;
    let image_data =
        required(body.image_data.as_deref()).ok_or(ApiError::BadRequest("Image data is required"))?;

    tracing::info!(bytes = image_data.len(), "analyzing image for background removal");
    let messages = state.composer.compose_background_analysis();
    let result = state.relay.complete(&messages, &state.config.model).await?;

    Ok(Json(BackgroundResponse {
        result,
        message: "Background removal completed".to_string(),
    }))
}

/// POST /api/generate-image – generation guidance for the enhanced prompt; request fields are echoed.
async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let body = request_body(payload)?;
    let prompt = required(body.prompt.as_deref()).ok_or(ApiError::BadRequest("Prompt is required"))?;

    tracing::info!(style = ?body.style, aspect_ratio = ?body.aspect_ratio, "generating image guidance");
    let image = state
        .composer
        .compose_image(prompt, body.style.as_deref(), body.aspect_ratio.as_deref());
    let guidance = state.relay.complete(&image.messages, &state.config.model).await?;

    Ok(Json(ImageResponse {
        success: true,
        message: "Image generation completed successfully".to_string(),
        prompt: prompt.to_string(),
        enhanced_prompt: image.enhanced,
        aspect_ratio: body.aspect_ratio,
        style: body.style,
        guidance: guidance.chars().take(state.config.guidance_limit).collect(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "apiKey": if state.relay.has_credential() { "Set" } else { "Not set" },
        "version": studio_core::version(),
    }))
}

async fn api_test() -> Json<Value> {
    Json(json!({
        "status": "Server is running!",
        "message": "API endpoints are working",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
