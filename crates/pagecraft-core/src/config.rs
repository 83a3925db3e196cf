//! Engine configuration.

use crate::error::EngineResult;
use crate::export::{DEFAULT_DPI, ExportFormat, ExportSpec};
use crate::guides::DEFAULT_THRESHOLD;
use crate::mask::DEFAULT_MARGIN;
use crate::snap::{ANGLE_SNAP_INCREMENT, GRID_SIZE, SnapMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables shared by the interactive and export paths.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid cell size in page units.
    pub grid_size: f64,
    /// Distance under which a guide is emitted.
    pub guide_threshold: f64,
    pub snap_mode: SnapMode,
    /// Angle snap increment in degrees.
    pub angle_increment: f64,
    /// Resolution used to convert physical units to page units.
    pub dpi: f64,
    /// Inset of shape masks from the mask edge.
    pub mask_margin: f64,
    /// Length of each crop mark in millimetres.
    pub crop_mark_mm: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            guide_threshold: DEFAULT_THRESHOLD,
            snap_mode: SnapMode::All,
            angle_increment: ANGLE_SNAP_INCREMENT,
            dpi: DEFAULT_DPI,
            mask_margin: DEFAULT_MARGIN,
            crop_mark_mm: 5.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export settings for `format` carrying this config's physical units.
    pub fn export_spec(&self, format: ExportFormat) -> ExportSpec {
        ExportSpec {
            dpi: self.dpi,
            crop_mark_mm: self.crop_mark_mm,
            ..ExportSpec::new(format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"grid_size": 8.0}"#).unwrap();
        assert_eq!(config.grid_size, 8.0);
        assert_eq!(config.dpi, 300.0);
        assert_eq!(config.guide_threshold, 5.0);
        assert_eq!(config.crop_mark_mm, 5.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dpi": 150.0, "snap_mode": "Grid"}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.dpi, 150.0);
        assert_eq!(config.snap_mode, SnapMode::Grid);
    }

    #[test]
    fn test_export_spec_uses_config_units() {
        let config = EngineConfig {
            dpi: 72.0,
            crop_mark_mm: 3.0,
            ..EngineConfig::default()
        };
        let spec = config.export_spec(ExportFormat::Pdf);
        assert_eq!(spec.format, ExportFormat::Pdf);
        assert_eq!(spec.dpi, 72.0);
        assert_eq!(spec.crop_mark_mm, 3.0);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(EngineConfig::from_json("{").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/pagecraft.json").unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Io(_)));
    }
}
