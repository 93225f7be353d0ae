//! Endpoint behavior against a stubbed relay (no network).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use studio_core::{
    CompletionRelay, PromptComposer, PromptTemplates, RelayError, Role, UpstreamMessage,
};
use studio_gateway::{build_app, AppState, GatewayConfig};

enum Reply {
    Text(String),
    Upstream(u16, &'static str),
    NoKey,
}

struct StubRelay {
    reply: Reply,
    seen: Mutex<Vec<(Vec<UpstreamMessage>, String)>>,
}

impl StubRelay {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn text(s: &str) -> Arc<Self> {
        Self::new(Reply::Text(s.to_string()))
    }
}

#[async_trait]
impl CompletionRelay for StubRelay {
    async fn complete(&self, messages: &[UpstreamMessage], model: &str) -> Result<String, RelayError> {
        self.seen.lock().unwrap().push((messages.to_vec(), model.to_string()));
        match &self.reply {
            Reply::Text(t) => Ok(t.clone()),
            Reply::Upstream(status, body) => Err(RelayError::Upstream {
                status: *status,
                body: body.to_string(),
            }),
            Reply::NoKey => Err(RelayError::Configuration),
        }
    }

    fn has_credential(&self) -> bool {
        !matches!(self.reply, Reply::NoKey)
    }
}

fn app_with(relay: Arc<StubRelay>, config: GatewayConfig) -> Router {
    let composer = PromptComposer::new(PromptTemplates::bundled().unwrap());
    build_app(AppState::new(config, composer, relay))
}

fn app(relay: Arc<StubRelay>) -> Router {
    app_with(relay, GatewayConfig::default())
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_raw(app: Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri(uri);
    if let Some(ct) = content_type {
        req = req.header("content-type", ct);
    }
    let res = app.oneshot(req.body(Body::from(body.to_string())).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("error body is JSON"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn missing_required_fields_are_client_errors() {
    let cases = [
        ("/api/generate-concept", json!({}), "Style is required"),
        ("/api/generate-concept", json!({"style": "", "topic": "x"}), "Style is required"),
        ("/api/remove-background", json!({}), "Image data is required"),
        ("/api/remove-background", json!({"imageData": "  "}), "Image data is required"),
        ("/api/generate-image", json!({"style": "x"}), "Prompt is required"),
        ("/api/generate-image", json!({"prompt": "", "style": "x", "aspectRatio": "1:1"}), "Prompt is required"),
    ];
    for (uri, body, message) in cases {
        let relay = StubRelay::text("unused");
        let (status, json) = post(app(relay.clone()), uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], message);
        assert!(relay.seen.lock().unwrap().is_empty(), "no relay call on 400");
    }
}

#[tokio::test]
async fn body_without_json_content_type_reads_as_empty_request() {
    let cases = [
        ("/api/generate-concept", "Style is required"),
        ("/api/remove-background", "Image data is required"),
        ("/api/generate-image", "Prompt is required"),
    ];
    for (uri, message) in cases {
        let (status, json) = post_raw(app(StubRelay::text("unused")), uri, None, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], message);
    }
}

#[tokio::test]
async fn unusable_json_bodies_get_json_errors() {
    let uri = "/api/generate-concept";
    let relay = StubRelay::text("unused");

    let (status, json) = post_raw(app(relay.clone()), uri, Some("application/json"), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!json["error"].as_str().unwrap().is_empty());

    let (status, json) = post_raw(app(relay.clone()), uri, Some("application/json"), r#"{"style":7}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!json["error"].as_str().unwrap().is_empty());

    assert!(relay.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concept_returns_relay_text() {
    let relay = StubRelay::text("STUB_CONCEPT");
    let (status, json) = post(
        app(relay.clone()),
        "/api/generate-concept",
        json!({"style": "minimalist poster", "topic": "coffee shop", "aspectRatio": "1:1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"concept": "STUB_CONCEPT"}));

    let seen = relay.seen.lock().unwrap();
    let (messages, model) = &seen[0];
    assert_eq!(model, "google/gemini-2.0-flash-exp:free");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[1].content.contains("minimalist poster in square (1:1 aspect ratio)"));
    assert!(messages[1].content.contains("\"coffee shop\""));
}

#[tokio::test]
async fn image_echoes_request_fields() {
    let relay = StubRelay::text("render it warm");
    let (status, json) = post(
        app(relay.clone()),
        "/api/generate-image",
        json!({"prompt": "a lighthouse at dusk", "style": "oil painting", "aspectRatio": "16:9"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["prompt"], "a lighthouse at dusk");
    assert_eq!(json["style"], "oil painting");
    assert_eq!(json["aspectRatio"], "16:9");
    assert_eq!(json["guidance"], "render it warm");
    assert_eq!(
        json["enhancedPrompt"],
        "a lighthouse at dusk. Style: oil painting. Aspect ratio: 16:9. High quality, professional, studio-grade image with cinematic lighting."
    );

    let seen = relay.seen.lock().unwrap();
    assert_eq!(seen[0].0.len(), 1);
    assert_eq!(seen[0].0[0].role, Role::User);
}

#[tokio::test]
async fn image_guidance_is_truncated() {
    let long = "é".repeat(40);
    let config = GatewayConfig {
        guidance_limit: 10,
        ..Default::default()
    };
    let (status, json) = post(
        app_with(StubRelay::text(&long), config),
        "/api/generate-image",
        json!({"prompt": "p"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["guidance"].as_str().unwrap().chars().count(), 10);
    assert_eq!(json["style"], Value::Null);
}

#[tokio::test]
async fn background_returns_result_and_message() {
    let (status, json) = post(
        app(StubRelay::text("cut along the edges")),
        "/api/remove-background",
        json!({"imageData": "data:image/png;base64,iVBORw0KGgo="}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "cut along the edges");
    assert_eq!(json["message"], "Background removal completed");
}

#[tokio::test]
async fn upstream_failure_surfaces_status_as_server_error() {
    for uri in ["/api/generate-concept", "/api/generate-image", "/api/remove-background"] {
        let relay = StubRelay::new(Reply::Upstream(429, "rate limited"));
        let body = json!({"style": "x", "prompt": "y", "imageData": "z"});
        let (status, json) = post(app(relay), uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("429"), "{error}");
        assert!(error.contains("rate limited"));
    }
}

#[tokio::test]
async fn missing_credential_is_a_server_error() {
    let (status, json) = post(
        app(StubRelay::new(Reply::NoKey)),
        "/api/generate-concept",
        json!({"style": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("API key not configured"));
}

#[tokio::test]
async fn health_reports_credential_presence() {
    let (status, body) = get(app(StubRelay::text("x")), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["apiKey"], "Set");
    assert!(json["timestamp"].as_str().is_some());

    let (_, body) = get(app(StubRelay::new(Reply::NoKey)), "/health").await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["apiKey"], "Not set");
}

#[tokio::test]
async fn api_test_endpoint_answers() {
    let (status, body) = get(app(StubRelay::text("x")), "/api/test").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Server is running!"));
}

#[tokio::test]
async fn unmatched_paths_serve_the_app_shell() {
    let (status, body) = get(app(StubRelay::text("x")), "/gallery/some/deep/link").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<main id=\"app\">"));

    let (status, body) = get(app(StubRelay::text("x")), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("AI Image Generator"));
}
