//! Data-URI image encoding.
//!
//! Everything that flows between ingestion, the edit client and the session is
//! an [`EncodedImage`]: a mime type plus a base64 payload, textually a
//! `data:<mime>;base64,<payload>` string.

use crate::error::{EditError, Result};
use base64::Engine;
use std::path::Path;

/// Default file name for an exported edit result.
pub const DOWNLOAD_FILE_NAME: &str = "edited-magic.png";

/// Raster formats the uploader advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An image held as a mime type plus base64 payload.
///
/// Immutable once constructed; the session replaces it wholesale rather than
/// mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    data: String,
}

impl EncodedImage {
    /// Encodes raw bytes under the given mime type.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Builds an image from an already base64-encoded payload.
    pub fn from_base64(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` string.
    ///
    /// This is the same shape check the edit client performs before issuing a
    /// request; anything else is rejected as [`EditError::InvalidImage`].
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| EditError::InvalidImage("missing data: scheme".into()))?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| EditError::InvalidImage("missing ;base64, separator".into()))?;

        let image = Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        };
        image.validate()?;
        Ok(image)
    }

    /// Checks the `image/*` mime invariant and that the payload is valid
    /// standard base64.
    pub fn validate(&self) -> Result<()> {
        let subtype = self
            .mime_type
            .strip_prefix("image/")
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        if subtype.is_none() {
            return Err(EditError::InvalidImage(format!(
                "not an image mime type: {}",
                self.mime_type
            )));
        }

        if self.data.is_empty() {
            return Err(EditError::InvalidImage("empty payload".into()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| EditError::InvalidImage(format!("invalid base64: {e}")))?;
        Ok(())
    }

    /// Returns the mime type tag.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Renders the image as a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| EditError::Decode(e.to_string()))
    }

    /// Decoded payload size in bytes, without allocating.
    pub fn size(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|&b| b == b'=').count();
        self.data.len() / 4 * 3 - padding
    }

    /// Saves the decoded bytes to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}
