//! Print-ready PDF export.
//!
//! The page, bleed included, is rasterized and embedded as one image on a
//! PDF page of the matching physical size. Optional crop marks are drawn
//! as vector lines in the bleed area.

use kurbo::{Point, Rect};
use pagecraft_core::assets::AssetResolver;
use pagecraft_core::export::{ExportSpec, px_to_mm};
use pagecraft_core::scene::SceneGraph;
use printpdf::{Color, ImageTransform, Line, Mm, PdfDocument, Rgb};

use crate::error::{RenderError, RenderResult};
use crate::raster::{flatten_rgb, render_pixmap};

/// Crop mark stroke width in points.
pub const CROP_MARK_THICKNESS: f32 = 0.25;

/// A crop mark segment in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkLine {
    pub start: Point,
    pub end: Point,
}

impl MarkLine {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// The eight crop mark segments for a trim box.
///
/// Each corner gets one horizontal and one vertical segment of `length`,
/// starting at the corner and running away from the artwork, so the marks
/// extend the trim lines into the bleed.
pub fn crop_marks(trim: Rect, length: f64) -> [MarkLine; 8] {
    let mark = |start: Point, dx: f64, dy: f64| MarkLine {
        start,
        end: Point::new(start.x + dx, start.y + dy),
    };
    let (x0, y0, x1, y1) = (trim.x0, trim.y0, trim.x1, trim.y1);
    [
        mark(Point::new(x0, y0), -length, 0.0),
        mark(Point::new(x0, y0), 0.0, -length),
        mark(Point::new(x1, y0), length, 0.0),
        mark(Point::new(x1, y0), 0.0, -length),
        mark(Point::new(x0, y1), -length, 0.0),
        mark(Point::new(x0, y1), 0.0, length),
        mark(Point::new(x1, y1), length, 0.0),
        mark(Point::new(x1, y1), 0.0, length),
    ]
}

/// Trim box of `page` in PDF millimetres, inset from the media box by the
/// bleed.
pub fn trim_box(page: &SceneGraph, spec: &ExportSpec) -> Rect {
    let (width_mm, height_mm) = spec.page_mm(page.width(), page.height());
    let bleed_mm = px_to_mm(spec.bleed_px(), spec.dpi);
    Rect::new(bleed_mm, bleed_mm, width_mm - bleed_mm, height_mm - bleed_mm)
}

/// Crop marks for `page`, each clipped to the bleed so it stays on the
/// media box.
pub fn page_crop_marks(page: &SceneGraph, spec: &ExportSpec) -> [MarkLine; 8] {
    let bleed_mm = px_to_mm(spec.bleed_px(), spec.dpi);
    crop_marks(trim_box(page, spec), spec.crop_mark_mm.min(bleed_mm))
}

/// Render `page` to PDF bytes.
#[allow(clippy::cast_possible_truncation)]
pub fn render_pdf(
    page: &SceneGraph,
    spec: &ExportSpec,
    assets: &dyn AssetResolver,
) -> RenderResult<Vec<u8>> {
    let pixmap = render_pixmap(page, spec, assets)?;
    let (width_mm, height_mm) = spec.page_mm(page.width(), page.height());

    let (doc, page1, layer1) = PdfDocument::new(
        "Pagecraft Export",
        Mm(width_mm as f32),
        Mm(height_mm as f32),
        "Layer 1",
    );
    let current_layer = doc.get_page(page1).get_layer(layer1);

    let bg = page.background;
    let rgb = flatten_rgb(&pixmap, [bg.r, bg.g, bg.b]);
    let buffer = printpdf::image_crate::RgbImage::from_raw(pixmap.width(), pixmap.height(), rgb)
        .ok_or_else(|| RenderError::Pdf("pixel buffer does not match pixmap size".to_string()))?;
    let dynamic_image = printpdf::image_crate::DynamicImage::ImageRgb8(buffer);
    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

    // Pixels at dpi * multiplier span exactly the physical page.
    let transform = ImageTransform {
        translate_x: Some(Mm(0.0)),
        translate_y: Some(Mm(0.0)),
        dpi: Some((spec.dpi * spec.multiplier) as f32),
        ..Default::default()
    };
    pdf_image.add_to_layer(current_layer.clone(), transform);

    if spec.crop_marks {
        current_layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        current_layer.set_outline_thickness(CROP_MARK_THICKNESS);
        for mark in page_crop_marks(page, spec) {
            current_layer.add_line(Line {
                points: vec![
                    (pdf_point(mark.start), false),
                    (pdf_point(mark.end), false),
                ],
                is_closed: false,
            });
        }
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| RenderError::Pdf(format!("PDF save failed: {e}")))?;
    log::debug!(
        "PDF page {width_mm:.2}x{height_mm:.2} mm, crop marks: {}",
        spec.crop_marks
    );
    Ok(bytes)
}

#[allow(clippy::cast_possible_truncation)]
fn pdf_point(p: Point) -> printpdf::Point {
    printpdf::Point::new(Mm(p.x as f32), Mm(p.y as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::assets::DataUriAssets;
    use pagecraft_core::export::ExportFormat;
    use pagecraft_core::shapes::SceneObject;

    fn page() -> SceneGraph {
        let mut page = SceneGraph::new(300, 150).unwrap();
        page.add(SceneObject::rectangle(Rect::new(10.0, 10.0, 100.0, 100.0)));
        page
    }

    #[test]
    fn test_crop_marks_outside_trim() {
        let trim = Rect::new(3.0, 3.0, 103.0, 53.0);
        let marks = crop_marks(trim, 5.0);
        assert_eq!(marks.len(), 8);
        for mark in &marks {
            assert!((mark.length() - 5.0).abs() < 1e-9);
            // Start on a trim corner, end outside the trim box.
            assert!(trim.x0 == mark.start.x || trim.x1 == mark.start.x);
            assert!(trim.y0 == mark.start.y || trim.y1 == mark.start.y);
            let mid = mark.start.midpoint(mark.end);
            assert!(mid.x <= trim.x0 || mid.x >= trim.x1 || mid.y <= trim.y0 || mid.y >= trim.y1);
        }
    }

    #[test]
    fn test_trim_box_inset_by_bleed() {
        let spec = ExportSpec::new(ExportFormat::Pdf).with_bleed(3.0);
        let trim = trim_box(&page(), &spec);
        assert!((trim.x0 - 3.0).abs() < 1e-9);
        // 300 px at 300 dpi = 25.4 mm of artwork.
        assert!((trim.width() - 25.4).abs() < 1e-9);
        assert!((trim.height() - 12.7).abs() < 1e-9);
    }

    #[test]
    fn test_page_crop_marks_stay_in_bleed() {
        let spec = ExportSpec::new(ExportFormat::Pdf)
            .with_bleed(3.0)
            .with_crop_marks(true);
        let (width_mm, height_mm) = spec.page_mm(page().width(), page().height());
        let media = Rect::new(0.0, 0.0, width_mm, height_mm);
        for mark in page_crop_marks(&page(), &spec) {
            // Default marks are 5 mm, the bleed only 3 mm.
            assert!((mark.length() - 3.0).abs() < 1e-9);
            assert!(media.inflate(1e-9, 1e-9).contains(mark.end), "{mark:?} outside {media:?}");
        }
    }

    #[test]
    fn test_crop_marks_without_bleed_rejected() {
        let spec = ExportSpec::new(ExportFormat::Pdf).with_crop_marks(true);
        let err = crate::export::Exporter::default().render(&page(), &spec).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Engine(pagecraft_core::error::EngineError::InvalidExportSpec(_))
        ));
    }

    #[test]
    fn test_pdf_header() {
        let spec = ExportSpec::new(ExportFormat::Pdf)
            .with_bleed(3.0)
            .with_crop_marks(true);
        let pdf = render_pdf(&page(), &spec, &DataUriAssets).unwrap();
        assert!(pdf.len() > 5);
        assert_eq!(&pdf[0..5], b"%PDF-");
    }
}
