//! Group payload for combining multiple objects.

use super::{Geometry, SceneObject};
use crate::bounds::bounds_of_group;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Children of a group object, expressed in the group's local frame.
///
/// A group exclusively owns its children; groups may nest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub children: Vec<SceneObject>,
}

impl Group {
    /// Move page-space children into a local frame starting at their union
    /// bounds, returning the group geometry that puts them back in place.
    pub(crate) fn normalize(mut children: Vec<SceneObject>) -> (Geometry, Vec<SceneObject>) {
        let union = bounds_of_group(&children).unwrap_or(Rect::ZERO);
        let offset = -union.origin().to_vec2();
        for child in &mut children {
            child.translate(offset);
        }
        (
            Geometry::new(union.origin(), union.width(), union.height()),
            children,
        )
    }

    /// Dissolve the group, composing its placement into each child.
    ///
    /// Rotation and scale compose exactly when the group's scale is uniform;
    /// a non-uniform group scale on a rotated child keeps the child's centre
    /// but cannot express the induced skew.
    pub fn dissolve(self, geometry: &Geometry) -> Vec<SceneObject> {
        let transform = geometry.transform();
        self.children
            .into_iter()
            .map(|mut child| {
                let center = transform * child.geometry.center();
                child.geometry.scale.x *= geometry.scale.x;
                child.geometry.scale.y *= geometry.scale.y;
                child.geometry.rotate_by(geometry.rotation());
                let shift: Vec2 = center - child.geometry.center();
                child.translate(shift);
                child
            })
            .collect()
    }

    /// Number of objects in this subtree, excluding the group itself.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.as_group().map_or(0, Group::descendant_count))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_group_keeps_page_bounds() {
        let a = SceneObject::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0));
        let b = SceneObject::rectangle(Rect::new(200.0, 200.0, 250.0, 300.0));
        let group = SceneObject::group(vec![a, b]);
        let bounds = group.bounds();
        assert!((bounds.x0 - 0.0).abs() < 1e-9);
        assert!((bounds.y0 - 0.0).abs() < 1e-9);
        assert!((bounds.x1 - 250.0).abs() < 1e-9);
        assert!((bounds.y1 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_children_are_local() {
        let a = SceneObject::rectangle(Rect::new(40.0, 60.0, 50.0, 70.0));
        let b = SceneObject::rectangle(Rect::new(80.0, 90.0, 100.0, 100.0));
        let group = SceneObject::group(vec![a, b]);
        assert_eq!(group.geometry.position, Point::new(40.0, 60.0));
        let children = &group.as_group().unwrap().children;
        assert_eq!(children[0].geometry.position, Point::ZERO);
        assert_eq!(children[1].geometry.position, Point::new(40.0, 30.0));
    }

    #[test]
    fn test_dissolve_after_move() {
        let a = SceneObject::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = SceneObject::rectangle(Rect::new(30.0, 0.0, 40.0, 10.0));
        let mut group = SceneObject::group(vec![a, b]);
        group.translate(Vec2::new(5.0, 7.0));
        let geometry = group.geometry;
        let g = into_group(group);
        let children = g.dissolve(&geometry);
        let b0 = children[0].bounds();
        let b1 = children[1].bounds();
        assert!((b0.x0 - 5.0).abs() < 1e-9 && (b0.y0 - 7.0).abs() < 1e-9);
        assert!((b1.x0 - 35.0).abs() < 1e-9 && (b1.y0 - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_dissolve_rotated_group() {
        let a = SceneObject::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = SceneObject::rectangle(Rect::new(90.0, 0.0, 100.0, 10.0));
        let mut group = SceneObject::group(vec![a, b]);
        group.geometry.set_rotation(180.0);
        let before = group.bounds();
        let geometry = group.geometry;
        let g = into_group(group);
        let children = g.dissolve(&geometry);
        // A half turn swaps the two squares.
        assert!((children[0].bounds().x0 - 90.0).abs() < 1e-9);
        assert!((children[1].bounds().x0 - 0.0).abs() < 1e-9);
        assert!((children[0].geometry.rotation() - 180.0).abs() < 1e-9);
        let after = crate::bounds::bounds_of_group(&children).unwrap();
        assert!((after.x0 - before.x0).abs() < 1e-9);
        assert!((after.x1 - before.x1).abs() < 1e-9);
    }

    #[test]
    fn test_descendant_count() {
        let inner = SceneObject::group(vec![
            SceneObject::rectangle(Rect::new(0.0, 0.0, 1.0, 1.0)),
            SceneObject::rectangle(Rect::new(2.0, 0.0, 3.0, 1.0)),
        ]);
        let outer = SceneObject::group(vec![inner, SceneObject::ellipse(Rect::new(0.0, 0.0, 5.0, 5.0))]);
        assert_eq!(outer.as_group().unwrap().descendant_count(), 4);
    }

    fn into_group(obj: SceneObject) -> Group {
        match obj.kind {
            crate::shapes::ObjectKind::Group(g) => g,
            other => panic!("not a group: {other:?}"),
        }
    }
}
