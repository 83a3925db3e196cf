//! Export entry points.
//!
//! [`Exporter`] dispatches a page to the SVG, raster or PDF path after
//! checking the page and the export settings. Background exports render an
//! owned snapshot, so edits made while they run never reach the artifact.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use pagecraft_core::assets::{AssetResolver, DataUriAssets};
use pagecraft_core::export::{ExportFormat, ExportSpec};
use pagecraft_core::mask::ShapeMaskKind;
use pagecraft_core::pages::Document;
use pagecraft_core::scene::SceneGraph;

use crate::clip::clip_to_shape;
use crate::error::{RenderError, RenderResult};
use crate::raster::{encode_jpeg, encode_png, render_pixmap};

/// Shared cancellation flag for background exports and batch jobs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> RenderResult<()> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A named rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// `name.ext` for the artifact's format.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Renders pages to export formats.
#[derive(Clone)]
pub struct Exporter {
    assets: Arc<dyn AssetResolver>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").finish_non_exhaustive()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Arc::new(DataUriAssets))
    }
}

impl Exporter {
    /// Create an exporter resolving images through `assets`.
    pub fn new(assets: Arc<dyn AssetResolver>) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &dyn AssetResolver {
        self.assets.as_ref()
    }

    /// Render `page` with `spec`.
    ///
    /// # Errors
    ///
    /// `InvalidDocument` for an empty page, `InvalidExportSpec` for bad
    /// settings, or the failure of the format's encoder.
    pub fn render(&self, page: &SceneGraph, spec: &ExportSpec) -> RenderResult<Vec<u8>> {
        self.render_with_cancel(page, spec, &CancelToken::new())
    }

    /// Render, giving up with `Cancelled` if `cancel` fires before the
    /// artifact is complete.
    pub fn render_with_cancel(
        &self,
        page: &SceneGraph,
        spec: &ExportSpec,
        cancel: &CancelToken,
    ) -> RenderResult<Vec<u8>> {
        spec.validate()?;
        page.ensure_renderable()?;
        cancel.check()?;

        let bytes = match spec.format {
            ExportFormat::Svg => crate::svg::render_svg(page, spec, self.assets()).into_bytes(),
            ExportFormat::Png => {
                let pixmap = render_pixmap(page, spec, self.assets())?;
                cancel.check()?;
                encode_png(&pixmap)?
            }
            ExportFormat::Jpeg => {
                let pixmap = render_pixmap(page, spec, self.assets())?;
                cancel.check()?;
                let bg = page.background;
                encode_jpeg(&pixmap, [bg.r, bg.g, bg.b], spec.quality)?
            }
            ExportFormat::Pdf => crate::pdf::render_pdf(page, spec, self.assets())?,
        };

        // Output finished after cancellation is dropped.
        cancel.check()?;
        log::debug!("Rendered {} ({} bytes)", spec.format, bytes.len());
        Ok(bytes)
    }

    /// Render `page` into a named artifact.
    pub fn export(
        &self,
        page: &SceneGraph,
        spec: &ExportSpec,
        name: impl Into<String>,
    ) -> RenderResult<Artifact> {
        let bytes = self.render(page, spec)?;
        Ok(Artifact {
            name: name.into(),
            format: spec.format,
            bytes,
        })
    }

    /// Render every page of `document`, named `page-1`, `page-2`, ...
    pub fn export_document(
        &self,
        document: &Document,
        spec: &ExportSpec,
    ) -> RenderResult<Vec<Artifact>> {
        document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| self.export(page, spec, format!("page-{}", index + 1)))
            .collect()
    }

    /// Render a snapshot of `page` on a worker thread.
    ///
    /// The page is cloned before the thread starts; the caller may keep
    /// editing the original.
    pub fn render_in_background(
        &self,
        page: &SceneGraph,
        spec: ExportSpec,
        cancel: CancelToken,
    ) -> thread::JoinHandle<RenderResult<Vec<u8>>> {
        let snapshot = page.clone();
        let exporter = self.clone();
        thread::spawn(move || exporter.render_with_cancel(&snapshot, &spec, &cancel))
    }

    /// Render `page` as PNG and crop it to a `size` square of shape `kind`.
    pub fn render_masked(
        &self,
        page: &SceneGraph,
        kind: ShapeMaskKind,
        size: u32,
        margin: f64,
    ) -> RenderResult<Vec<u8>> {
        page.ensure_renderable()?;
        let pixmap = render_pixmap(page, &ExportSpec::new(ExportFormat::Png), self.assets())?;
        let clipped = clip_to_shape(&pixmap, kind, size, margin)?;
        encode_png(&clipped)
    }
}
