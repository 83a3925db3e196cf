//! Image payload.
//!
//! The scene stores only a source reference; pixel data is fetched through an
//! [`AssetResolver`](crate::assets::AssetResolver) when the page is rendered.

use serde::{Deserialize, Serialize};

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// Image reference carried by an image object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Storage key, URL, or `data:` URI understood by the asset resolver.
    pub source: String,
    /// Intrinsic pixel size, if known.
    #[serde(default)]
    pub source_width: u32,
    #[serde(default)]
    pub source_height: u32,
}

impl ImageContent {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_width: 0,
            source_height: 0,
        }
    }

    pub fn with_source_size(mut self, width: u32, height: u32) -> Self {
        self.source_width = width;
        self.source_height = height;
        self
    }

    /// Intrinsic aspect ratio (width / height), if known.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.source_width > 0 && self.source_height > 0)
            .then(|| f64::from(self.source_width) / f64::from(self.source_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageFormat::from_magic_bytes(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF8"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89]), None);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(ImageFormat::from_mime_type("image/webp"), Some(ImageFormat::WebP));
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(ImageContent::new("a").aspect_ratio(), None);
        let img = ImageContent::new("a").with_source_size(200, 100);
        assert!((img.aspect_ratio().unwrap() - 2.0).abs() < f64::EPSILON);
    }
}
