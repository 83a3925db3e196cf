//! Rasterization through usvg/resvg into tiny-skia pixmaps.

use std::sync::{Arc, OnceLock};

use image::ImageEncoder;
use pagecraft_core::assets::AssetResolver;
use pagecraft_core::export::ExportSpec;
use pagecraft_core::scene::SceneGraph;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::svg::page_svg;

/// System fonts, loaded once per process.
fn fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("Loaded {} font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Round a page extent scaled by `multiplier` to whole pixels, at least one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scaled_px(extent: f64, multiplier: f64) -> u32 {
    (extent * multiplier).round().max(1.0) as u32
}

/// Rasterize SVG markup into a `width` x `height` pixmap, stretching the
/// document's own size to fit.
#[allow(clippy::cast_precision_loss)]
pub fn rasterize(svg: &str, width: u32, height: u32) -> RenderResult<Pixmap> {
    let opt = usvg::Options {
        fontdb: fonts(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        RenderError::Raster(format!("cannot allocate a {width}x{height} pixmap"))
    })?;

    let size = tree.size();
    let transform = Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Render `page` to pixels at the export multiplier, with bleed.
///
/// The page content is rasterized on its own, then drawn at
/// `(bleed, bleed)` on a canvas filled with the page background.
pub fn render_pixmap(
    page: &SceneGraph,
    spec: &ExportSpec,
    assets: &dyn AssetResolver,
) -> RenderResult<Pixmap> {
    let m = spec.multiplier;
    let svg = page_svg(page, assets);
    let content = rasterize(
        &svg,
        scaled_px(f64::from(page.width()), m),
        scaled_px(f64::from(page.height()), m),
    )?;

    let bleed = spec.bleed_px();
    if bleed <= 0.0 {
        return Ok(content);
    }

    let (full_w, full_h) = spec.canvas_px(page.width(), page.height());
    let (full_w, full_h) = (scaled_px(full_w, m), scaled_px(full_h, m));
    let mut canvas = Pixmap::new(full_w, full_h).ok_or_else(|| {
        RenderError::Raster(format!("cannot allocate a {full_w}x{full_h} pixmap"))
    })?;
    let bg = page.background;
    canvas.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

    #[allow(clippy::cast_possible_truncation)]
    let offset = (bleed * m).round() as i32;
    canvas.draw_pixmap(
        offset,
        offset,
        content.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    log::debug!(
        "Placed {}x{} page on {full_w}x{full_h} bleed canvas at {offset}",
        content.width(),
        content.height()
    );
    Ok(canvas)
}

/// Straight-alpha RGBA bytes of a pixmap.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    data
}

/// Encode a pixmap as PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let rgba = demultiplied_rgba(pixmap);
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("PNG finish: {e}")))?;
    }
    Ok(png_data)
}

/// RGB bytes of a pixmap with transparency flattened onto `background`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn flatten_rgb(pixmap: &Pixmap, background: [u8; 3]) -> Vec<u8> {
    let mut rgb_data = Vec::with_capacity(pixmap.pixels().len() * 3);
    for pixel in pixmap.pixels() {
        // Premultiplied: colour + background * (1 - alpha).
        let inv = 1.0 - f32::from(pixel.alpha()) / 255.0;
        for (channel, bg) in [pixel.red(), pixel.green(), pixel.blue()].into_iter().zip(background) {
            rgb_data.push(f32::from(bg).mul_add(inv, f32::from(channel)).round().min(255.0) as u8);
        }
    }
    rgb_data
}

/// Encode a pixmap as JPEG, flattening transparency onto `background`.
pub fn encode_jpeg(pixmap: &Pixmap, background: [u8; 3], quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let rgb_data = flatten_rgb(pixmap, background);

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
