//! Export settings and physical-unit conversion.
//!
//! Every conversion between millimetres and page pixels goes through
//! [`mm_to_px`] and [`px_to_mm`] with a single DPI value.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Print resolution used when none is configured.
pub const DEFAULT_DPI: f64 = 300.0;

/// Default lossy quality (1-100).
pub const DEFAULT_QUALITY: u8 = 90;

/// Convert millimetres to pixels at `dpi`.
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / MM_PER_INCH * dpi
}

/// Convert pixels to millimetres at `dpi`.
pub fn px_to_mm(px: f64, dpi: f64) -> f64 {
    px / dpi * MM_PER_INCH
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Whether the format is a pixel image.
    pub fn is_raster(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(EngineError::InvalidExportSpec(format!(
                "unknown format '{other}'"
            ))),
        }
    }
}

/// Configuration of one export operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSpec {
    pub format: ExportFormat,
    /// Raster resolution multiplier applied to page dimensions.
    pub multiplier: f64,
    /// Lossy quality, 1-100. Only JPEG uses it.
    pub quality: u8,
    /// Bleed margin in millimetres.
    pub bleed_mm: f64,
    /// Draw crop marks (PDF only).
    pub crop_marks: bool,
    /// Resolution used to convert millimetres to page units.
    pub dpi: f64,
    /// Length of each crop mark in millimetres.
    pub crop_mark_mm: f64,
}

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            multiplier: 1.0,
            quality: DEFAULT_QUALITY,
            bleed_mm: 0.0,
            crop_marks: false,
            dpi: DEFAULT_DPI,
            crop_mark_mm: 5.0,
        }
    }
}

impl ExportSpec {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_bleed(mut self, bleed_mm: f64) -> Self {
        self.bleed_mm = bleed_mm;
        self
    }

    pub fn with_crop_marks(mut self, crop_marks: bool) -> Self {
        self.crop_marks = crop_marks;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Check the export settings for out-of-range values.
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.bleed_mm.is_finite() && self.bleed_mm >= 0.0) {
            return Err(EngineError::InvalidExportSpec(format!(
                "bleed must be non-negative, got {}",
                self.bleed_mm
            )));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(EngineError::InvalidExportSpec(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(EngineError::InvalidExportSpec(format!(
                "multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(EngineError::InvalidExportSpec(format!(
                "quality must be within 1-100, got {}",
                self.quality
            )));
        }
        if !(self.crop_mark_mm.is_finite() && self.crop_mark_mm >= 0.0) {
            return Err(EngineError::InvalidExportSpec(format!(
                "crop mark length must be non-negative, got {}",
                self.crop_mark_mm
            )));
        }
        if self.crop_marks && self.bleed_mm <= 0.0 {
            return Err(EngineError::InvalidExportSpec(
                "crop marks need a bleed to sit in".to_string(),
            ));
        }
        Ok(())
    }

    /// Bleed in page pixels.
    pub fn bleed_px(&self) -> f64 {
        bleed_px(self.bleed_mm, self.dpi)
    }

    /// Full canvas size in page pixels including bleed on every side.
    pub fn canvas_px(&self, width: u32, height: u32) -> (f64, f64) {
        let bleed = 2.0 * self.bleed_px();
        (f64::from(width) + bleed, f64::from(height) + bleed)
    }

    /// PDF page size in millimetres including bleed.
    pub fn page_mm(&self, width: u32, height: u32) -> (f64, f64) {
        let (w, h) = self.canvas_px(width, height);
        (px_to_mm(w, self.dpi), px_to_mm(h, self.dpi))
    }
}

/// Bleed margin in page pixels.
pub fn bleed_px(bleed_mm: f64, dpi: f64) -> f64 {
    mm_to_px(bleed_mm.max(0.0), dpi)
}
