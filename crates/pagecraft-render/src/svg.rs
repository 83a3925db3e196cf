//! SVG serialization of a page.
//!
//! Every object becomes a `<g>` carrying its local-to-page matrix, with the
//! shape drawn in its local box. The same markup feeds the rasterizer, so
//! PNG, JPEG and PDF output match the SVG export.

use std::fmt::Write;

use pagecraft_core::assets::AssetResolver;
use pagecraft_core::export::ExportSpec;
use pagecraft_core::scene::SceneGraph;
use pagecraft_core::shapes::{
    ImageContent, ObjectKind, SceneObject, SerializableColor, ShapeStyle, TextAlign, TextContent,
};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Serialize `page` to SVG markup, expanded by the export bleed.
///
/// With bleed the root `viewBox` starts at `(-b, -b)` so page coordinates
/// are unchanged, and the background covers the whole expanded canvas.
pub fn render_svg(page: &SceneGraph, spec: &ExportSpec, assets: &dyn AssetResolver) -> String {
    write_page(page, spec.bleed_px(), assets)
}

/// Page markup without bleed, as rasterized for content.
pub(crate) fn page_svg(page: &SceneGraph, assets: &dyn AssetResolver) -> String {
    write_page(page, 0.0, assets)
}

fn write_page(page: &SceneGraph, bleed: f64, assets: &dyn AssetResolver) -> String {
    let width = f64::from(page.width()) + 2.0 * bleed;
    let height = f64::from(page.height()) + 2.0 * bleed;
    let min = if bleed > 0.0 { -bleed } else { 0.0 };

    let mut svg = SvgWriter {
        out: String::with_capacity(4096),
        assets,
    };
    let _ = write!(
        svg.out,
        "<svg xmlns=\"{SVG_NS}\" width=\"{width}\" height=\"{height}\" viewBox=\"{min} {min} {width} {height}\">",
    );
    let _ = write!(
        svg.out,
        "<rect x=\"{min}\" y=\"{min}\" width=\"{width}\" height=\"{height}\"{}/>",
        fill_attrs(Some(page.background)),
    );

    for object in page.objects() {
        svg.object(object);
    }

    svg.out.push_str("</svg>");
    svg.out
}

struct SvgWriter<'a> {
    out: String,
    assets: &'a dyn AssetResolver,
}

impl SvgWriter<'_> {
    fn object(&mut self, object: &SceneObject) {
        let style = &object.style;

        // The shadow filter sits outside the transform so its offset is in
        // the parent's units.
        let shadowed = style.shadow.is_some();
        if let Some(shadow) = &style.shadow {
            let id = object.id();
            let _ = write!(
                self.out,
                "<defs><filter id=\"shadow-{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
                 <feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{}\"/>\
                 </filter></defs><g filter=\"url(#shadow-{id})\">",
                shadow.offset_x,
                shadow.offset_y,
                shadow.blur / 2.0,
                shadow.color.to_hex(),
                shadow.color.alpha(),
            );
        }

        let [a, b, c, d, e, f] = object.geometry.transform().as_coeffs();
        let _ = write!(self.out, "<g transform=\"matrix({a} {b} {c} {d} {e} {f})\"");
        let opacity = style.effective_opacity();
        if opacity < 1.0 {
            let _ = write!(self.out, " opacity=\"{opacity}\"");
        }
        self.out.push('>');

        let width = object.geometry.width();
        let height = object.geometry.height();
        match &object.kind {
            ObjectKind::Rectangle { corner_radius } => {
                let _ = write!(self.out, "<rect width=\"{width}\" height=\"{height}\"");
                if *corner_radius > 0.0 {
                    let _ = write!(self.out, " rx=\"{corner_radius}\" ry=\"{corner_radius}\"");
                }
                let _ = write!(self.out, "{}/>", paint_attrs(style));
            }
            ObjectKind::Ellipse => {
                let _ = write!(
                    self.out,
                    "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
                    width / 2.0,
                    height / 2.0,
                    width / 2.0,
                    height / 2.0,
                    paint_attrs(style),
                );
            }
            ObjectKind::Polygon { points } => {
                let points: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
                let _ = write!(
                    self.out,
                    "<polygon points=\"{}\"{}/>",
                    points.join(" "),
                    paint_attrs(style),
                );
            }
            ObjectKind::Path { data } => {
                let _ = write!(
                    self.out,
                    "<path d=\"{}\"{}/>",
                    escape_xml(data),
                    paint_attrs(style),
                );
            }
            ObjectKind::Text(text) => self.text(text, width, style),
            ObjectKind::Image(image) => self.image(image, width, height),
            ObjectKind::Group(group) => {
                for child in &group.children {
                    self.object(child);
                }
            }
        }

        self.out.push_str("</g>");
        if shadowed {
            self.out.push_str("</g>");
        }
    }

    fn text(&mut self, text: &TextContent, width: f64, style: &ShapeStyle) {
        let font = &text.font;
        let (anchor, x) = match font.align {
            TextAlign::Start => ("start", 0.0),
            TextAlign::Middle => ("middle", width / 2.0),
            TextAlign::End => ("end", width),
        };
        let _ = write!(
            self.out,
            "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" text-anchor=\"{anchor}\"{}>",
            escape_xml(&font.family),
            font.size,
            font.weight.css_weight(),
            paint_attrs(style),
        );
        for (index, line) in text.lines().enumerate() {
            let y = font.size + index as f64 * font.line_advance();
            let _ = write!(
                self.out,
                "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
                escape_xml(line)
            );
        }
        self.out.push_str("</text>");
    }

    fn image(&mut self, image: &ImageContent, width: f64, height: f64) {
        match self.assets.resolve(&image.source) {
            Ok(asset) => {
                let _ = write!(
                    self.out,
                    "<image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                    asset.to_data_uri(),
                );
            }
            Err(e) => {
                log::warn!("Rendering placeholder for image: {e}");
                let _ = write!(
                    self.out,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"#e0e0e0\" stroke=\"#999\" stroke-width=\"1\"/>",
                );
            }
        }
    }
}

fn fill_attrs(color: Option<SerializableColor>) -> String {
    match color {
        Some(c) if c.a == 255 => format!(" fill=\"{}\"", c.to_hex()),
        Some(c) => format!(" fill=\"{}\" fill-opacity=\"{}\"", c.to_hex(), c.alpha()),
        None => " fill=\"none\"".to_string(),
    }
}

fn paint_attrs(style: &ShapeStyle) -> String {
    let mut attrs = fill_attrs(style.fill_color);
    if let Some(stroke) = style.stroke_color {
        if style.stroke_width > 0.0 {
            let _ = write!(
                attrs,
                " stroke=\"{}\" stroke-width=\"{}\"",
                stroke.to_hex(),
                style.stroke_width
            );
            if stroke.a < 255 {
                let _ = write!(attrs, " stroke-opacity=\"{}\"", stroke.alpha());
            }
        }
    }
    attrs
}

/// Escape special XML characters in text content.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
