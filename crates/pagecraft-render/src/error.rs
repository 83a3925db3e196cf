//! Renderer error types.

use pagecraft_core::EngineError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The page or export settings were rejected before rendering.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Generated markup could not be parsed back for rasterization.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixel buffer allocation or compositing failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// PNG or JPEG encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// One record of a batch job failed.
    #[error("Record {record} failed: {source}")]
    BatchRecord {
        record: String,
        #[source]
        source: Box<RenderError>,
    },

    /// The job was cancelled; nothing was produced.
    #[error("Export cancelled")]
    Cancelled,
}

impl RenderError {
    /// Wrap an error as the failure of batch record `record`.
    pub fn for_record(record: impl Into<String>, source: RenderError) -> Self {
        RenderError::BatchRecord {
            record: record.into(),
            source: Box::new(source),
        }
    }
}
