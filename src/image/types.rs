//! Core image types.

use crate::error::{FlagPortraitError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Parses a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An encoded image: a format plus a standard base64 payload.
///
/// The payload is shared, so clones are cheap and an asset handed to the
/// generation client is the same allocation the session holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    format: ImageFormat,
    payload: Arc<str>,
}

impl ImageAsset {
    /// Wraps an already-encoded base64 payload.
    pub fn new(format: ImageFormat, payload: impl Into<Arc<str>>) -> Self {
        Self {
            format,
            payload: payload.into(),
        }
    }

    /// Encodes raw bytes, detecting the format from magic bytes.
    ///
    /// Unrecognized data is labelled PNG; the service sniffs the bytes anyway.
    pub fn from_bytes(data: &[u8]) -> Self {
        let format = ImageFormat::from_magic_bytes(data).unwrap_or_default();
        Self::from_bytes_with_format(data, format)
    }

    /// Encodes raw bytes with an explicit format.
    pub fn from_bytes_with_format(data: &[u8], format: ImageFormat) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(data);
        Self::new(format, payload)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FlagPortraitError::Decode("not a data URL".into()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| FlagPortraitError::Decode("data URL is not base64".into()))?;
        let format = ImageFormat::from_mime_type(mime)
            .ok_or_else(|| FlagPortraitError::Decode(format!("unsupported MIME type {mime}")))?;
        let data = crate::image::encoder::decode_base64_lenient(payload)?;
        Ok(Self::from_bytes_with_format(&data, format))
    }

    /// Returns the image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the MIME type of the payload.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Returns the base64 payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns true if the payload carries no data.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decodes the payload back into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| FlagPortraitError::Decode(e.to_string()))
    }

    /// Returns the image as a data URL, suitable for previews.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.payload)
    }

    /// Returns the number of live handles to this payload.
    pub(crate) fn share_count(&self) -> usize {
        Arc::strong_count(&self.payload)
    }
}
