//! Pagecraft Render Library
//!
//! Export pipeline for Pagecraft pages: SVG markup, PNG and JPEG via
//! usvg/resvg, print-ready PDF with bleed and crop marks, shape-mask
//! cropping and batch rendering of data records.

pub mod batch;
pub mod clip;
mod error;
pub mod export;
pub mod pdf;
pub mod raster;
pub mod svg;

pub use batch::{Archive, ArchiveEntry, BatchOptions, BatchRunner, RecordFailure, run_batch};
pub use clip::{clip_to_shape, mask_path_to_skia};
pub use error::{RenderError, RenderResult};
pub use export::{Artifact, CancelToken, Exporter};
pub use pdf::{MarkLine, crop_marks, page_crop_marks, render_pdf};
pub use raster::{encode_png, rasterize, render_pixmap};
pub use svg::render_svg;
