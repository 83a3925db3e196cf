//! Placement of an object on the page.
//!
//! An object's content lives in a local box `(0, 0, width, height)`. The box
//! is scaled, rotated about its centre, and placed so that its anchor point
//! lands on `position`. Anchors describe the unrotated, scaled box.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Horizontal anchor used to interpret `position.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorX {
    #[default]
    Left,
    Center,
    Right,
}

impl AnchorX {
    fn fraction(self) -> f64 {
        match self {
            AnchorX::Left => 0.0,
            AnchorX::Center => 0.5,
            AnchorX::Right => 1.0,
        }
    }
}

/// Vertical anchor used to interpret `position.y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl AnchorY {
    fn fraction(self) -> f64 {
        match self {
            AnchorY::Top => 0.0,
            AnchorY::Center => 0.5,
            AnchorY::Bottom => 1.0,
        }
    }
}

/// Per-axis scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    pub fn uniform(factor: f64) -> Self {
        Self { x: factor, y: factor }
    }

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Wire form of [`Geometry`]; invariants are restored on conversion.
#[derive(Serialize, Deserialize)]
struct GeometryRepr {
    position: Point,
    width: f64,
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    scale: Scale,
    #[serde(default)]
    anchor_x: AnchorX,
    #[serde(default)]
    anchor_y: AnchorY,
}

impl From<GeometryRepr> for Geometry {
    fn from(repr: GeometryRepr) -> Self {
        let mut geometry = Geometry::new(repr.position, repr.width, repr.height);
        geometry.set_rotation(repr.rotation);
        geometry.scale = repr.scale;
        geometry.anchor_x = repr.anchor_x;
        geometry.anchor_y = repr.anchor_y;
        geometry
    }
}

impl From<Geometry> for GeometryRepr {
    fn from(geometry: Geometry) -> Self {
        Self {
            position: geometry.position,
            width: geometry.width,
            height: geometry.height,
            rotation: geometry.rotation,
            scale: geometry.scale,
            anchor_x: geometry.anchor_x,
            anchor_y: geometry.anchor_y,
        }
    }
}

/// Geometry of a scene object.
///
/// Width and height are never negative; rotation is kept in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeometryRepr", into = "GeometryRepr")]
pub struct Geometry {
    /// Page coordinates of the anchor point.
    pub position: Point,
    width: f64,
    height: f64,
    /// Rotation in degrees, clockwise, about the box centre.
    rotation: f64,
    pub scale: Scale,
    pub anchor_x: AnchorX,
    pub anchor_y: AnchorY,
}

impl Geometry {
    /// Create an unrotated, unscaled geometry anchored at its top-left corner.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            position,
            width: sanitize_extent(width),
            height: sanitize_extent(height),
            rotation: 0.0,
            scale: Scale::IDENTITY,
            anchor_x: AnchorX::Left,
            anchor_y: AnchorY::Top,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Unscaled local size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Set the unscaled local size; negative or non-finite values become zero.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = sanitize_extent(width);
        self.height = sanitize_extent(height);
    }

    /// Size after scaling, before rotation.
    pub fn scaled_size(&self) -> Size {
        Size::new(self.width * self.scale.x.abs(), self.height * self.scale.y.abs())
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation in degrees; the stored value is normalized.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = normalize_degrees(degrees);
    }

    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Centre of the box in page coordinates.
    pub fn center(&self) -> Point {
        let scaled = self.scaled_size();
        Point::new(
            self.position.x + (0.5 - self.anchor_x.fraction()) * scaled.width,
            self.position.y + (0.5 - self.anchor_y.fraction()) * scaled.height,
        )
    }

    /// Local-to-page transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center().to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate((-self.width / 2.0, -self.height / 2.0))
    }

    /// Local content box.
    pub fn local_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Axis-aligned bounds after scale, rotation and translation.
    pub fn bounds(&self) -> Rect {
        self.transform().transform_rect_bbox(self.local_rect())
    }

    /// Move by a page-space offset.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Change the horizontal anchor without moving the object on the page.
    pub fn set_anchor_x(&mut self, anchor: AnchorX) {
        let scaled = self.scaled_size().width;
        self.position.x += (anchor.fraction() - self.anchor_x.fraction()) * scaled;
        self.anchor_x = anchor;
    }

    /// Change the vertical anchor without moving the object on the page.
    pub fn set_anchor_y(&mut self, anchor: AnchorY) {
        let scaled = self.scaled_size().height;
        self.position.y += (anchor.fraction() - self.anchor_y.fraction()) * scaled;
        self.anchor_y = anchor;
    }

    /// Top-left of the unrotated scaled box.
    pub fn origin(&self) -> Point {
        let scaled = self.scaled_size();
        Point::new(
            self.position.x - self.anchor_x.fraction() * scaled.width,
            self.position.y - self.anchor_y.fraction() * scaled.height,
        )
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(Point::ZERO, 0.0, 0.0)
    }
}

fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
