//! Upload types and the port for the external watermark tool.

use async_trait::async_trait;

use quotagate_core::{AppError, AppResult};

/// Image encodings accepted by the processing route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// `image/png`.
    Png,
    /// `image/jpeg`.
    Jpeg,
    /// `image/webp`.
    Webp,
}

impl ImageFormat {
    /// Resolves a format from a `Content-Type` value, ignoring parameters.
    pub fn from_content_type(value: &str) -> AppResult<Self> {
        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/webp" => Ok(Self::Webp),
            _ => Err(AppError::Validation(
                "invalid file type, use PNG, JPG, or WebP".to_owned(),
            )),
        }
    }

    /// File extension handed to the external tool.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Canonical MIME type.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// An uploaded image awaiting processing.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Encoded image bytes as received.
    pub bytes: Vec<u8>,
    /// Declared encoding.
    pub format: ImageFormat,
}

/// Port for the external watermark removal tool.
#[async_trait]
pub trait WatermarkRemover: Send + Sync {
    /// Runs the tool on one image and returns the processed bytes in the same format.
    async fn remove_watermark(&self, upload: ImageUpload) -> AppResult<Vec<u8>>;
}
