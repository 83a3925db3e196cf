//! Text payload.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    /// CSS numeric weight.
    pub fn css_weight(&self) -> u16 {
        match self {
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// Horizontal text alignment inside the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Start,
    Middle,
    End,
}

/// Font metrics used for layout and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub family: String,
    /// Font size in page units.
    pub size: f64,
    #[serde(default)]
    pub weight: FontWeight,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub align: TextAlign,
}

fn default_line_height() -> f64 {
    FontMetrics::DEFAULT_LINE_HEIGHT
}

impl FontMetrics {
    pub const DEFAULT_SIZE: f64 = 24.0;
    pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;
    /// Average advance of one character relative to the font size.
    const AVERAGE_ADVANCE: f64 = 0.6;

    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            ..Self::default()
        }
    }

    /// Distance between consecutive baselines.
    pub fn line_advance(&self) -> f64 {
        self.size * self.line_height
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: Self::DEFAULT_SIZE,
            weight: FontWeight::default(),
            line_height: Self::DEFAULT_LINE_HEIGHT,
            align: TextAlign::default(),
        }
    }
}

/// Text content plus its font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    pub font: FontMetrics,
}

impl TextContent {
    pub fn new(content: impl Into<String>, font: FontMetrics) -> Self {
        Self {
            content: content.into(),
            font,
        }
    }

    /// Lines of the content, split on `\n`.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    /// Approximate layout box when no measured size is available.
    pub fn estimate_size(&self) -> Size {
        let longest = self.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        let line_count = self.lines().count().max(1);
        Size::new(
            longest as f64 * self.font.size * FontMetrics::AVERAGE_ADVANCE,
            line_count as f64 * self.font.line_advance(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_size() {
        let text = TextContent::new("abcd\nab", FontMetrics::new("Inter", 10.0));
        let size = text.estimate_size();
        assert!((size.width - 24.0).abs() < 1e-9);
        assert!((size.height - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let text = TextContent::new("", FontMetrics::default());
        let size = text.estimate_size();
        assert_eq!(size.width, 0.0);
        assert!((size.height - FontMetrics::DEFAULT_SIZE * FontMetrics::DEFAULT_LINE_HEIGHT).abs() < 1e-9);
    }
}
