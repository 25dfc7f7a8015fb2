//! File ingestion.
//!
//! Reads a user-selected file fully into memory and materializes it as an
//! [`EncodedImage`]. No format validation happens here beyond mime tagging;
//! the edit client rejects non-image payloads before any request is sent.

use crate::encoded::{EncodedImage, ImageFormat};
use crate::error::{EditError, Result};
use std::path::Path;

/// Mime tag used when the bytes match no known raster format.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Reads an image file and encodes it as a data-URI payload.
///
/// The mime type is taken from the magic bytes when recognizable, then from
/// the file extension. An unreadable or empty file yields an error and no
/// partially-built image is ever observable.
pub async fn ingest(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(EditError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("{} is empty", path.display()),
        )));
    }

    let mime = ImageFormat::from_magic_bytes(&bytes)
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .map(|f| f.mime_type())
        .unwrap_or(UNKNOWN_MIME);

    tracing::debug!(path = %path.display(), mime, size = bytes.len(), "ingested image");
    Ok(EncodedImage::from_bytes(mime, &bytes))
}

/// Encodes bytes that arrived with a declared media type (the browser upload
/// path, where the file input reports the type itself).
pub fn ingest_bytes(bytes: &[u8], declared_mime: &str) -> Result<EncodedImage> {
    if bytes.is_empty() {
        return Err(EditError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty file selection",
        )));
    }
    Ok(EncodedImage::from_bytes(declared_mime, bytes))
}
