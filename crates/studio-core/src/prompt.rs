//! Prompt composer: pure functions from (style, topic, aspect ratio) to upstream messages.
//!
//! The wording lives in [`PromptTemplates`], bundled from `assets/prompts.toml` and
//! overridable by a file, so the composer itself carries no prose.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::PromptError;
use crate::types::UpstreamMessage;

const DEFAULT_PROMPTS: &str = include_str!("../assets/prompts.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub concept_system: String,
    /// `{style}` and `{ratio}` placeholders.
    pub concept_intro: String,
    /// `{topic}` placeholder; skipped entirely when no topic is given.
    pub topic_clause: String,
    pub quality_block: String,
    /// `{prompt}`, `{style}` and `{ratio}` placeholders.
    pub image_enhancement: String,
    /// `{prompt}` placeholder, filled with the enhanced prompt.
    pub image_request: String,
    pub background_system: String,
    pub background_user: String,
    pub fallback_ratio: String,
    pub fallback_style: String,
    #[serde(default)]
    pub ratio_descriptions: BTreeMap<String, String>,
}

impl PromptTemplates {
    pub fn bundled() -> Result<Self, PromptError> {
        Ok(toml::from_str(DEFAULT_PROMPTS)?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, PromptError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// File at `path` when given and present, bundled defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(p) if p.exists() => Self::load_from_path(p),
            Some(p) => {
                tracing::warn!(path = %p.display(), "prompt templates not found, using bundled defaults");
                Self::bundled()
            }
            None => Self::bundled(),
        }
    }
}

/// Enhanced prompt plus the messages that carry it upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    pub enhanced: String,
    pub messages: Vec<UpstreamMessage>,
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    templates: PromptTemplates,
}

impl PromptComposer {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Descriptor for a raw ratio value; unknown or absent values get the generic fallback.
    pub fn describe_ratio(&self, aspect_ratio: Option<&str>) -> &str {
        aspect_ratio
            .map(str::trim)
            .and_then(|r| self.templates.ratio_descriptions.get(r))
            .map(String::as_str)
            .unwrap_or(&self.templates.fallback_ratio)
    }

    /// `[system, user]` pair asking the model for a detailed image prompt.
    pub fn compose_concept(
        &self,
        style: &str,
        topic: Option<&str>,
        aspect_ratio: Option<&str>,
    ) -> Vec<UpstreamMessage> {
        let t = &self.templates;
        let ratio = self.describe_ratio(aspect_ratio);

        let mut user = render(&t.concept_intro, &[("style", style), ("ratio", ratio)]);
        if let Some(topic) = topic.map(str::trim).filter(|s| !s.is_empty()) {
            user.push_str(&render(&t.topic_clause, &[("topic", topic)]));
        }
        user.push_str(&t.quality_block);

        vec![
            UpstreamMessage::system(t.concept_system.clone()),
            UpstreamMessage::user(user),
        ]
    }

    /// Single user message wrapping the caller's prompt with style, ratio and the quality clause.
    pub fn compose_image(
        &self,
        prompt: &str,
        style: Option<&str>,
        aspect_ratio: Option<&str>,
    ) -> ImagePrompt {
        let t = &self.templates;
        let style = style
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&t.fallback_style);
        let ratio = aspect_ratio
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&t.fallback_ratio);

        let enhanced = render(
            &t.image_enhancement,
            &[("prompt", prompt), ("style", style), ("ratio", ratio)],
        );
        let request = render(&t.image_request, &[("prompt", &enhanced)]);

        ImagePrompt {
            enhanced,
            messages: vec![UpstreamMessage::user(request)],
        }
    }

    pub fn compose_background_analysis(&self) -> Vec<UpstreamMessage> {
        vec![
            UpstreamMessage::system(self.templates.background_system.clone()),
            UpstreamMessage::user(self.templates.background_user.clone()),
        ]
    }
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned, so user
/// text containing braces is copied verbatim.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => {
                        out.push_str(value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        out.push('{');
                        rest = after;
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
