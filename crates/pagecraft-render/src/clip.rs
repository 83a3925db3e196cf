//! Cropping rendered images to a shape mask.

use kurbo::{BezPath, PathEl};
use pagecraft_core::mask::{ShapeMask, ShapeMaskKind};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use crate::error::{RenderError, RenderResult};

/// Convert a kurbo path into a tiny-skia path.
///
/// Returns `None` for an empty path.
#[allow(clippy::cast_possible_truncation)]
pub fn mask_path_to_skia(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32);
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Crop `source` to a `size` x `size` image of the shape `kind`.
///
/// The mask path is filled opaque first, then the source is drawn over it
/// keeping only pixels where both are present. The source is scaled to
/// cover the square and centred. Pixels outside the shape are fully
/// transparent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn clip_to_shape(
    source: &Pixmap,
    kind: ShapeMaskKind,
    size: u32,
    margin: f64,
) -> RenderResult<Pixmap> {
    let mask = ShapeMask::new(kind, f64::from(size)).with_margin(margin);
    let mut out = Pixmap::new(size, size)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate a {size}x{size} mask")))?;

    let Some(path) = mask_path_to_skia(&mask.path()) else {
        log::debug!("{kind} mask at size {size} is empty");
        return Ok(out);
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    out.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let (sw, sh) = (source.width() as f32, source.height() as f32);
    let side = size as f32;
    let scale = (side / sw).max(side / sh);
    let tx = (side - sw * scale) / 2.0;
    let ty = (side - sh * scale) / 2.0;
    let image_paint = PixmapPaint {
        blend_mode: BlendMode::SourceIn,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    out.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &image_paint,
        Transform::from_row(scale, 0.0, 0.0, scale, tx, ty),
        None,
    );
    Ok(out)
}
