//! Post-transform bounding boxes.
//!
//! Bounds are always recomputed from geometry; nothing here is cached, so a
//! value is only valid until the next mutation of the objects it came from.

use crate::shapes::{ObjectKind, SceneObject};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape};

/// Tight axis-aligned bounds of `object` in page coordinates.
pub fn bounds_of(object: &SceneObject) -> Rect {
    bounds_in(object, Affine::IDENTITY)
}

/// Union of the bounds of `objects`, or `None` for an empty slice.
pub fn bounds_of_group(objects: &[SceneObject]) -> Option<Rect> {
    union(objects.iter().map(bounds_of))
}

/// Union over an iterator of rectangles in a single pass.
pub fn union(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().fold(None, |acc: Option<Rect>, r| {
        Some(match acc {
            Some(acc) => Rect::new(
                acc.x0.min(r.x0),
                acc.y0.min(r.y0),
                acc.x1.max(r.x1),
                acc.y1.max(r.y1),
            ),
            None => r,
        })
    })
}

fn bounds_in(object: &SceneObject, parent: Affine) -> Rect {
    let affine = parent * object.geometry.transform();
    let local = object.geometry.local_rect();
    match &object.kind {
        ObjectKind::Rectangle { .. } | ObjectKind::Text(_) | ObjectKind::Image(_) => {
            affine.transform_rect_bbox(local)
        }
        ObjectKind::Ellipse => (affine * Ellipse::from_rect(local)).bounding_box(),
        ObjectKind::Polygon { points } => points_bbox(points.iter().map(|p| affine * *p))
            .unwrap_or_else(|| affine.transform_rect_bbox(local)),
        ObjectKind::Path { .. } => match object.bez_path() {
            Some(path) => path_bbox(path, affine),
            None => affine.transform_rect_bbox(local),
        },
        ObjectKind::Group(group) => union(group.children.iter().map(|c| bounds_in(c, affine)))
            .unwrap_or_else(|| affine.transform_rect_bbox(local)),
    }
}

fn path_bbox(mut path: BezPath, affine: Affine) -> Rect {
    path.apply_affine(affine);
    path.bounding_box()
}

fn points_bbox(points: impl Iterator<Item = Point>) -> Option<Rect> {
    union(points.map(|p| Rect::from_points(p, p)))
}

/// Edge and centre accessors on a bounding box.
pub trait Edges {
    fn left(&self) -> f64;
    fn right(&self) -> f64;
    fn top(&self) -> f64;
    fn bottom(&self) -> f64;
    fn center_x(&self) -> f64;
    fn center_y(&self) -> f64;
}

impl Edges for Rect {
    fn left(&self) -> f64 {
        self.x0.min(self.x1)
    }

    fn right(&self) -> f64 {
        self.x0.max(self.x1)
    }

    fn top(&self) -> f64 {
        self.y0.min(self.y1)
    }

    fn bottom(&self) -> f64 {
        self.y0.max(self.y1)
    }

    fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}
