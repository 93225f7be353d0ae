//! Shared domain types: selections, uploaded images, gallery items and upstream messages.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ImageError;

/// Output framing offered by the wizard. Unknown values on the wire fall back to
/// a generic descriptor in the composer, so parsing is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "3:4")]
    Vertical,
    #[serde(rename = "4:3")]
    Horizontal,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Vertical,
        AspectRatio::Horizontal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Vertical => "3:4",
            AspectRatio::Horizontal => "4:3",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|r| r.as_str() == raw)
    }

    /// Nominal pixel size used for preview placeholders.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Vertical => (1080, 1440),
            AspectRatio::Horizontal => (1440, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wizard selections for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub style: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub topic: String,
    /// Manually typed concept prompt.
    pub concept_prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMime {
    Jpeg,
    Png,
    Webp,
}

impl ImageMime {
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, ImageError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(ImageMime::Jpeg),
            "image/png" => Ok(ImageMime::Png),
            "image/webp" => Ok(ImageMime::Webp),
            other => Err(ImageError::UnsupportedType(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ImageError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(ImageMime::Jpeg),
            "png" => Ok(ImageMime::Png),
            "webp" => Ok(ImageMime::Webp),
            _ => Err(ImageError::UnsupportedType(path.display().to_string())),
        }
    }
}

/// An image picked for the current session, kept as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub raw_data: String,
    pub name: String,
    pub mime_type: ImageMime,
}

impl UploadedImage {
    pub fn from_bytes(name: &str, mime_type: ImageMime, bytes: &[u8]) -> Self {
        Self {
            raw_data: format!("data:{};base64,{}", mime_type.as_mime(), STANDARD.encode(bytes)),
            name: name.to_string(),
            mime_type,
        }
    }

    /// Accepts `data:<mime>;base64,<payload>`; the payload must decode.
    pub fn from_data_url(name: &str, data_url: &str) -> Result<Self, ImageError> {
        let rest = data_url.strip_prefix("data:").ok_or(ImageError::InvalidDataUrl)?;
        let (mime, payload) = rest.split_once(";base64,").ok_or(ImageError::InvalidDataUrl)?;
        let mime_type = ImageMime::from_mime(mime)?;
        STANDARD
            .decode(payload)
            .map_err(|_| ImageError::InvalidDataUrl)?;
        Ok(Self {
            raw_data: data_url.to_string(),
            name: name.to_string(),
            mime_type,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let mime_type = ImageMime::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::from_bytes(&name, mime_type, &bytes))
    }
}

/// A saved generation result. Field names match the browser storage format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub image_url: String,
    pub style: String,
    pub aspect_ratio: AspectRatio,
    pub concept: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message sent to the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: Role,
    pub content: String,
}

impl UpstreamMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
