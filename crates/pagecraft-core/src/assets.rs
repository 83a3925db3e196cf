//! Image asset resolution.
//!
//! Image objects carry only a source reference. An [`AssetResolver`] turns
//! that reference into encoded image bytes when a page is rendered.

use crate::error::{EngineError, EngineResult};
use crate::shapes::ImageFormat;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::sync::RwLock;

/// Encoded image bytes plus their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Asset {
    /// Wrap encoded bytes, detecting the format from magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> EngineResult<Self> {
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or_else(|| {
            EngineError::UnresolvedAsset("unrecognised image data".to_string())
        })?;
        Ok(Self { bytes, format })
    }

    /// `data:` URI carrying the asset inline.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), STANDARD.encode(&self.bytes))
    }
}

/// Resolves image source references to encoded bytes.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, source: &str) -> EngineResult<Asset>;
}

/// Decodes inline `data:<mime>;base64,<payload>` references.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriAssets;

impl DataUriAssets {
    pub fn decode(source: &str) -> EngineResult<Asset> {
        let unresolved = || EngineError::UnresolvedAsset(truncate(source));
        let rest = source.strip_prefix("data:").ok_or_else(unresolved)?;
        let (header, payload) = rest.split_once(',').ok_or_else(unresolved)?;
        let mime = header.strip_suffix(";base64").ok_or_else(unresolved)?;
        let bytes = STANDARD.decode(payload.trim()).map_err(|_| unresolved())?;
        let format = ImageFormat::from_mime_type(mime)
            .or_else(|| ImageFormat::from_magic_bytes(&bytes))
            .ok_or_else(unresolved)?;
        Ok(Asset { bytes, format })
    }
}

impl AssetResolver for DataUriAssets {
    fn resolve(&self, source: &str) -> EngineResult<Asset> {
        Self::decode(source)
    }
}

/// In-memory asset table keyed by source reference.
///
/// `data:` references that are not in the table are decoded inline.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    assets: RwLock<HashMap<String, Asset>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, source: impl Into<String>, asset: Asset) {
        if let Ok(mut assets) = self.assets.write() {
            assets.insert(source.into(), asset);
        }
    }

    pub fn len(&self) -> usize {
        self.assets.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve(&self, source: &str) -> EngineResult<Asset> {
        let assets = self
            .assets
            .read()
            .map_err(|_| EngineError::UnresolvedAsset("asset table poisoned".to_string()))?;
        if let Some(asset) = assets.get(source) {
            return Ok(asset.clone());
        }
        if source.starts_with("data:") {
            return DataUriAssets::decode(source);
        }
        Err(EngineError::UnresolvedAsset(truncate(source)))
    }
}

/// Keep error messages short when the source is a long inline URI.
fn truncate(source: &str) -> String {
    const MAX: usize = 64;
    match source.char_indices().nth(MAX) {
        Some((index, _)) => format!("{}...", &source[..index]),
        None => source.to_string(),
    }
}
