//! Shape mask geometry.
//!
//! Each mask kind is a closed path centred in a `size × size` square, inset by
//! a margin. Rasterized clipping lives in the render crate.

use kurbo::{BezPath, Circle, Point, Rect, Shape};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Default inset of a mask from the edge of its square.
pub const DEFAULT_MARGIN: f64 = 4.0;

/// Inner radius of a star relative to its outer radius.
const STAR_INNER_RATIO: f64 = 0.5;

/// Named mask silhouettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMaskKind {
    Circle,
    Square,
    Star,
    Heart,
    Hexagon,
}

impl ShapeMaskKind {
    pub const ALL: [ShapeMaskKind; 5] = [
        ShapeMaskKind::Circle,
        ShapeMaskKind::Square,
        ShapeMaskKind::Star,
        ShapeMaskKind::Heart,
        ShapeMaskKind::Hexagon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeMaskKind::Circle => "circle",
            ShapeMaskKind::Square => "square",
            ShapeMaskKind::Star => "star",
            ShapeMaskKind::Heart => "heart",
            ShapeMaskKind::Hexagon => "hexagon",
        }
    }
}

impl fmt::Display for ShapeMaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeMaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mask shape '{s}'"))
    }
}

/// A mask kind at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeMask {
    pub kind: ShapeMaskKind,
    pub size: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

impl ShapeMask {
    pub fn new(kind: ShapeMaskKind, size: f64) -> Self {
        Self {
            kind,
            size,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.size / 2.0, self.size / 2.0)
    }

    /// Radius of the circle the shape is inscribed in.
    pub fn outer_radius(&self) -> f64 {
        (self.size / 2.0 - self.margin).max(0.0)
    }

    pub fn path(&self) -> BezPath {
        path_for(self.kind, self.size, self.margin)
    }
}

/// Closed path for `kind` centred in a `size` square inset by `margin`.
pub fn path_for(kind: ShapeMaskKind, size: f64, margin: f64) -> BezPath {
    let center = Point::new(size / 2.0, size / 2.0);
    let radius = (size / 2.0 - margin).max(0.0);
    match kind {
        ShapeMaskKind::Circle => Circle::new(center, radius).to_path(0.1),
        ShapeMaskKind::Square => {
            let side = (size - 2.0 * margin).max(0.0);
            Rect::from_center_size(center, (side, side)).to_path(0.1)
        }
        ShapeMaskKind::Star => {
            let vertices = (0..10).map(|i| {
                let r = if i % 2 == 0 { radius } else { radius * STAR_INNER_RATIO };
                polar(center, r, -PI / 2.0 + i as f64 * PI / 5.0)
            });
            closed_polygon(vertices)
        }
        ShapeMaskKind::Hexagon => {
            let vertices = (0..6).map(|i| polar(center, radius, -PI / 2.0 + i as f64 * PI / 3.0));
            closed_polygon(vertices)
        }
        ShapeMaskKind::Heart => heart(center, radius),
    }
}

fn polar(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

fn closed_polygon(mut vertices: impl Iterator<Item = Point>) -> BezPath {
    let mut path = BezPath::new();
    if let Some(first) = vertices.next() {
        path.move_to(first);
        for v in vertices {
            path.line_to(v);
        }
        path.close_path();
    }
    path
}

/// Approximate heart from four cubic segments, filling the circle of `r`
/// about `c` horizontally.
fn heart(c: Point, r: f64) -> BezPath {
    let p = |dx: f64, dy: f64| Point::new(c.x + dx * r, c.y + dy * r);
    let mut path = BezPath::new();
    path.move_to(p(0.0, -0.45));
    path.curve_to(p(0.0, -0.95), p(-0.95, -0.95), p(-0.95, -0.35));
    path.curve_to(p(-0.95, 0.2), p(-0.3, 0.55), p(0.0, 0.9));
    path.curve_to(p(0.3, 0.55), p(0.95, 0.2), p(0.95, -0.35));
    path.curve_to(p(0.95, -0.95), p(0.0, -0.95), p(0.0, -0.45));
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn test_circle_bounds() {
        let path = path_for(ShapeMaskKind::Circle, 100.0, 4.0);
        let b = path.bounding_box();
        assert!((b.x0 - 4.0).abs() < 0.1);
        assert!((b.x1 - 96.0).abs() < 0.1);
    }

    #[test]
    fn test_square_side() {
        let b = path_for(ShapeMaskKind::Square, 100.0, 10.0).bounding_box();
        assert!((b.width() - 80.0).abs() < EPSILON);
        assert!((b.x0 - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_star_starts_at_top() {
        let path = path_for(ShapeMaskKind::Star, 100.0, 0.0);
        let first = path.elements()[0];
        match first {
            kurbo::PathEl::MoveTo(p) => {
                assert!((p.x - 50.0).abs() < EPSILON);
                assert!(p.y.abs() < EPSILON);
            }
            other => panic!("unexpected element {other:?}"),
        }
        // move + 9 lines + close
        assert_eq!(path.elements().len(), 11);
    }

    #[test]
    fn test_star_inner_vertices() {
        let path = path_for(ShapeMaskKind::Star, 100.0, 0.0);
        if let kurbo::PathEl::LineTo(p) = path.elements()[1] {
            let d = p.distance(Point::new(50.0, 50.0));
            assert!((d - 25.0).abs() < EPSILON);
        } else {
            panic!("expected line");
        }
    }

    #[test]
    fn test_hexagon_vertices_on_radius() {
        let mask = ShapeMask::new(ShapeMaskKind::Hexagon, 200.0);
        let path = mask.path();
        let vertices: Vec<Point> = path
            .elements()
            .iter()
            .filter_map(|el| match el {
                kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(vertices.len(), 6);
        for v in vertices {
            assert!((v.distance(mask.center()) - mask.outer_radius()).abs() < EPSILON);
        }
    }

    #[test]
    fn test_heart_within_square() {
        let b = path_for(ShapeMaskKind::Heart, 100.0, 4.0).bounding_box();
        assert!(b.x0 >= 0.0 && b.y0 >= 0.0);
        assert!(b.x1 <= 100.0 && b.y1 <= 100.0);
    }

    #[test]
    fn test_oversized_margin_yields_empty_shape() {
        let b = path_for(ShapeMaskKind::Circle, 10.0, 20.0).bounding_box();
        assert!(b.width() < EPSILON);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Heart".parse::<ShapeMaskKind>(), Ok(ShapeMaskKind::Heart));
        assert!("blob".parse::<ShapeMaskKind>().is_err());
        assert_eq!(ShapeMaskKind::Hexagon.to_string(), "hexagon");
    }
}
