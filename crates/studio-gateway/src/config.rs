//! Gateway configuration.
//!
//! | Source | Example | Notes |
//! |--------|---------|-------|
//! | defaults | port 3000 | see [`GatewayConfig::load`] |
//! | `STUDIO_CONFIG` file | `config/gateway.toml` | optional, extension may be omitted |
//! | `STUDIO__<FIELD>` env | `STUDIO__MODEL=...` | overrides the file |
//! | `PORT` | `8080` | overrides everything |
//! | `OPENROUTER_API_KEY` | `sk-or-...` | the upstream credential, never read from files |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use studio_core::{DEFAULT_MODEL, OPENROUTER_URL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Static SPA files; `index.html` doubles as the fallback for unmatched paths.
    pub public_dir: String,
    pub upstream_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sent upstream as `HTTP-Referer`.
    pub referer: String,
    /// Sent upstream as `X-Title`.
    pub app_title: String,
    pub body_limit_bytes: usize,
    /// Character cap on the `guidance` text returned by `/api/generate-image`.
    pub guidance_limit: usize,
    #[serde(default)]
    pub prompts_path: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_dir: "public".to_string(),
            upstream_url: OPENROUTER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            temperature: 0.7,
            referer: "http://localhost:3000".to_string(),
            app_title: "AI Image Generator".to_string(),
            body_limit_bytes: 50 * 1024 * 1024,
            guidance_limit: 500,
            prompts_path: None,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Load config from defaults, optional file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let config_path = std::env::var("STUDIO_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());

        let built = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("public_dir", d.public_dir)?
            .set_default("upstream_url", d.upstream_url)?
            .set_default("model", d.model)?
            .set_default("max_tokens", d.max_tokens as i64)?
            .set_default("temperature", d.temperature as f64)?
            .set_default("referer", d.referer)?
            .set_default("app_title", d.app_title)?
            .set_default("body_limit_bytes", d.body_limit_bytes as i64)?
            .set_default("guidance_limit", d.guidance_limit as i64)?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("STUDIO").separator("__"))
            .build()?;

        let mut cfg: Self = built.try_deserialize()?;
        if let Some(port) = parse_port(std::env::var("PORT").ok()) {
            cfg.port = port;
        }
        cfg.api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok(cfg)
    }

    pub fn api_key_present(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `public_dir` as given when it exists, else the crate's bundled `public/`.
    pub fn resolved_public_dir(&self) -> PathBuf {
        let configured = PathBuf::from(&self.public_dir);
        if configured.exists() {
            return configured;
        }
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public")
    }
}

/// `PORT` override; unparseable values are ignored with a warning.
fn parse_port(raw: Option<String>) -> Option<u16> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(port) => Some(port),
        Err(e) => {
            tracing::warn!(port = %raw, error = %e, "ignoring invalid PORT");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = ["PORT", "STUDIO_CONFIG", "STUDIO__MODEL", "STUDIO__APP_TITLE", "OPENROUTER_API_KEY"];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults_match_the_upstream_contract() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.model, "google/gemini-2.0-flash-exp:free");
        assert_eq!(cfg.max_tokens, 4000);
        assert_eq!(cfg.body_limit_bytes, 52_428_800);
        assert!(!cfg.api_key_present());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn missing_public_dir_falls_back_to_bundled_shell() {
        let cfg = GatewayConfig {
            public_dir: "/definitely/not/here".into(),
            ..Default::default()
        };
        assert!(cfg.resolved_public_dir().join("index.html").exists());
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port(Some(" 8080 ".into())), Some(8080));
        assert_eq!(parse_port(Some("eighty".into())), None);
        assert_eq!(parse_port(Some("70000".into())), None);
        assert_eq!(parse_port(None), None);
    }

    #[test]
    #[serial]
    fn load_layers_file_env_and_overrides() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gateway.toml");
        std::fs::write(&file, "model = \"file/model\"\napp_title = \"From File\"\nguidance_limit = 42\n").unwrap();

        std::env::set_var("STUDIO_CONFIG", &file);
        std::env::set_var("STUDIO__APP_TITLE", "From Env");
        std::env::set_var("PORT", "8081");
        std::env::set_var("OPENROUTER_API_KEY", "  sk-or-test  ");

        let cfg = GatewayConfig::load();
        clear_env();
        let cfg = cfg.unwrap();

        assert_eq!(cfg.model, "file/model");
        assert_eq!(cfg.app_title, "From Env");
        assert_eq!(cfg.guidance_limit, 42);
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(cfg.max_tokens, 4000);
    }

    #[test]
    #[serial]
    fn load_ignores_blank_key_and_invalid_port() {
        clear_env();
        std::env::set_var("STUDIO_CONFIG", "/definitely/not/here/gateway");
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("OPENROUTER_API_KEY", "   ");

        let cfg = GatewayConfig::load();
        clear_env();
        let cfg = cfg.unwrap();

        assert_eq!(cfg.port, 3000);
        assert!(!cfg.api_key_present());
        assert_eq!(cfg.model, "google/gemini-2.0-flash-exp:free");
    }
}
