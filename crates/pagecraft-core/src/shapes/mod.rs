//! Scene object definitions.

mod geometry;
mod group;
mod image;
mod style;
mod text;

pub use geometry::{AnchorX, AnchorY, Geometry, Scale, normalize_degrees};
pub use group::Group;
pub use image::{ImageContent, ImageFormat};
pub use style::{SerializableColor, Shadow, ShapeStyle};
pub use text::{FontMetrics, FontWeight, TextAlign, TextContent};

use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = Uuid;

/// Type-specific payload of a scene object.
///
/// Polygon points and path data are expressed in the object's local box
/// `(0, 0, width, height)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Rectangle {
        #[serde(default)]
        corner_radius: f64,
    },
    Ellipse,
    Polygon {
        points: Vec<Point>,
    },
    Path {
        /// SVG path data.
        data: String,
    },
    Text(TextContent),
    Image(ImageContent),
    Group(Group),
}

impl ObjectKind {
    /// Short type tag, matching the exchange format.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Rectangle { .. } => "rectangle",
            ObjectKind::Ellipse => "ellipse",
            ObjectKind::Polygon { .. } => "polygon",
            ObjectKind::Path { .. } => "path",
            ObjectKind::Text(_) => "text",
            ObjectKind::Image(_) => "image",
            ObjectKind::Group(_) => "group",
        }
    }
}

/// A drawable unit on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub(crate) id: ObjectId,
    pub geometry: Geometry,
    #[serde(default)]
    pub style: ShapeStyle,
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Create an object with a fresh id.
    pub fn new(geometry: Geometry, kind: ObjectKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            style: ShapeStyle::default(),
            kind,
        }
    }

    /// Axis-aligned rectangle covering `rect`.
    pub fn rectangle(rect: Rect) -> Self {
        Self::new(
            geometry_for(rect),
            ObjectKind::Rectangle { corner_radius: 0.0 },
        )
    }

    /// Ellipse inscribed in `rect`.
    pub fn ellipse(rect: Rect) -> Self {
        Self::new(geometry_for(rect), ObjectKind::Ellipse)
    }

    /// Polygon from page-space vertices.
    pub fn polygon(points: &[Point]) -> Self {
        let rect = points_bounds(points);
        let origin = rect.origin().to_vec2();
        let local = points.iter().map(|p| *p - origin).collect();
        Self::new(geometry_for(rect), ObjectKind::Polygon { points: local })
    }

    /// Path from page-space geometry; stored relative to its bounds.
    pub fn path(path: &BezPath) -> Self {
        let rect = path.bounding_box();
        let mut local = path.clone();
        local.apply_affine(kurbo::Affine::translate(-rect.origin().to_vec2()));
        Self::new(geometry_for(rect), ObjectKind::Path { data: local.to_svg() })
    }

    /// Text box at `position` sized by the estimated layout.
    pub fn text(position: Point, content: TextContent) -> Self {
        let size = content.estimate_size();
        Self::new(
            Geometry::new(position, size.width, size.height),
            ObjectKind::Text(content),
        )
    }

    /// Image placed in `rect`.
    pub fn image(rect: Rect, content: ImageContent) -> Self {
        Self::new(geometry_for(rect), ObjectKind::Image(content))
    }

    /// Group the given objects, keeping their page placement.
    pub fn group(children: Vec<SceneObject>) -> Self {
        let (geometry, children) = Group::normalize(children);
        Self::new(geometry, ObjectKind::Group(Group { children }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Builder: replace the style.
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder: set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.geometry.set_rotation(degrees);
        self
    }

    /// Post-transform bounds in page coordinates.
    pub fn bounds(&self) -> Rect {
        crate::bounds::bounds_of(self)
    }

    /// Move by a page-space offset.
    pub fn translate(&mut self, delta: Vec2) {
        self.geometry.translate(delta);
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ObjectKind::Group(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            ObjectKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextContent> {
        match &self.kind {
            ObjectKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageContent> {
        match &self.kind {
            ObjectKind::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Parsed path data for path objects.
    pub fn bez_path(&self) -> Option<BezPath> {
        match &self.kind {
            ObjectKind::Path { data } => BezPath::from_svg(data).ok(),
            _ => None,
        }
    }

    /// Give this object, and every descendant, a new unique id.
    pub fn regenerate_ids(&mut self) {
        self.id = Uuid::new_v4();
        if let ObjectKind::Group(group) = &mut self.kind {
            for child in &mut group.children {
                child.regenerate_ids();
            }
        }
    }

    /// Visit every text payload in this object and its descendants.
    pub fn for_each_text_mut(&mut self, f: &mut impl FnMut(&mut TextContent)) {
        match &mut self.kind {
            ObjectKind::Text(text) => f(text),
            ObjectKind::Group(group) => {
                for child in &mut group.children {
                    child.for_each_text_mut(f);
                }
            }
            _ => {}
        }
    }

    /// Visit every text payload in this object and its descendants.
    pub fn for_each_text(&self, f: &mut impl FnMut(&TextContent)) {
        match &self.kind {
            ObjectKind::Text(text) => f(text),
            ObjectKind::Group(group) => {
                for child in &group.children {
                    child.for_each_text(f);
                }
            }
            _ => {}
        }
    }

    /// Find an object by id within this subtree.
    pub fn find(&self, id: ObjectId) -> Option<&SceneObject> {
        if self.id == id {
            return Some(self);
        }
        self.as_group()?.children.iter().find_map(|c| c.find(id))
    }
}

fn geometry_for(rect: Rect) -> Geometry {
    let rect = rect.abs();
    Geometry::new(rect.origin(), rect.width(), rect.height())
}

fn points_bounds(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_flipped_rect() {
        let obj = SceneObject::rectangle(Rect::new(100.0, 100.0, 50.0, 60.0));
        assert_eq!(obj.geometry.position, Point::new(50.0, 60.0));
        assert!((obj.geometry.width() - 50.0).abs() < f64::EPSILON);
        assert!((obj.geometry.height() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_polygon_local_points() {
        let obj = SceneObject::polygon(&[
            Point::new(10.0, 10.0),
            Point::new(30.0, 10.0),
            Point::new(20.0, 40.0),
        ]);
        assert_eq!(obj.geometry.position, Point::new(10.0, 10.0));
        match &obj.kind {
            ObjectKind::Polygon { points } => {
                assert_eq!(points[0], Point::ZERO);
                assert_eq!(points[2], Point::new(10.0, 30.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_path_roundtrip_through_svg() {
        let mut path = BezPath::new();
        path.move_to((5.0, 5.0));
        path.line_to((25.0, 5.0));
        path.line_to((25.0, 15.0));
        path.close_path();
        let obj = SceneObject::path(&path);
        let local = obj.bez_path().unwrap();
        let b = local.bounding_box();
        assert!((b.x0).abs() < 1e-9 && (b.y0).abs() < 1e-9);
        assert!((b.width() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_regenerate_ids_recurses() {
        let a = SceneObject::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = SceneObject::rectangle(Rect::new(20.0, 0.0, 30.0, 10.0));
        let (a_id, b_id) = (a.id(), b.id());
        let mut group = SceneObject::group(vec![a, b]);
        let group_id = group.id();
        group.regenerate_ids();
        assert_ne!(group.id(), group_id);
        let children = &group.as_group().unwrap().children;
        assert_ne!(children[0].id(), a_id);
        assert_ne!(children[1].id(), b_id);
    }

    #[test]
    fn test_type_tag_serialization() {
        let obj = SceneObject::ellipse(Rect::new(0.0, 0.0, 10.0, 10.0));
        let json = serde_json::to_string(&obj).unwrap();
        assert!(json.contains("\"type\":\"ellipse\""));
        let back: SceneObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obj);
    }
}
