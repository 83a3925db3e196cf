//! Paint properties shared by every scene object.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut chars = hex.chars();
                let mut next = || {
                    let c = chars.next()?;
                    channel(&format!("{c}{c}"))
                };
                Some(Self::new(next()?, next()?, next()?, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// `#rrggbb` without alpha (SVG paint syntax).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a fraction in `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Drop shadow painted beneath an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: SerializableColor,
    /// Offset in page units.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Blur radius in page units.
    pub blur: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: SerializableColor::new(0, 0, 0, 96),
            offset_x: 4.0,
            offset_y: 4.0,
            blur: 6.0,
        }
    }
}

/// Style properties for scene objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Stroke color (None = no stroke).
    pub stroke_color: Option<SerializableColor>,
    /// Stroke width in local units.
    pub stroke_width: f64,
    #[serde(default)]
    pub shadow: Option<Shadow>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// A style with only a fill.
    pub fn filled(color: SerializableColor) -> Self {
        Self {
            fill_color: Some(color),
            ..Self::default()
        }
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Option<Color> {
        self.stroke_color.map(|c| c.into())
    }

    /// Set the fill color from a peniko Color.
    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(|c| c.into());
    }

    /// Set the stroke color from a peniko Color.
    pub fn set_stroke(&mut self, color: Option<Color>) {
        self.stroke_color = color.map(|c| c.into());
    }

    /// Opacity clamped to `[0, 1]`.
    pub fn effective_opacity(&self) -> f64 {
        self.opacity.clamp(0.0, 1.0)
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: Some(SerializableColor::black()),
            stroke_color: None,
            stroke_width: 0.0,
            shadow: None,
            opacity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(SerializableColor::from_hex("#ff0000"), Some(SerializableColor::new(255, 0, 0, 255)));
        assert_eq!(SerializableColor::from_hex("#0f0"), Some(SerializableColor::new(0, 255, 0, 255)));
        assert_eq!(SerializableColor::from_hex("#00000080"), Some(SerializableColor::new(0, 0, 0, 128)));
        assert_eq!(SerializableColor::from_hex("red"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(SerializableColor::new(18, 52, 86, 7).to_hex(), "#123456");
    }

    #[test]
    fn test_peniko_roundtrip() {
        let color = SerializableColor::new(10, 20, 30, 40);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_opacity_clamped() {
        let style = ShapeStyle {
            opacity: 1.7,
            ..ShapeStyle::default()
        };
        assert!((style.effective_opacity() - 1.0).abs() < f64::EPSILON);
    }
}
