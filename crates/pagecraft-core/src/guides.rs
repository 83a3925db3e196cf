//! Smart guides.
//!
//! While an object is dragged its bounds are compared with every sibling and
//! with the canvas centre. Near matches produce transient guide lines, and the
//! active object can be snapped onto the nearest one. Guides live only as long
//! as the [`GuideEngine`] that computed them.

use crate::bounds::Edges;
use crate::shapes::SceneObject;
use kurbo::{Line, Rect, Vec2};

/// Default distance under which a guide is emitted, in page units.
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// A transient alignment line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guide {
    /// Vertical line at an x coordinate.
    Vertical(f64),
    /// Horizontal line at a y coordinate.
    Horizontal(f64),
}

impl Guide {
    /// Line spanning `canvas` for drawing the guide.
    pub fn line(&self, canvas: Rect) -> Line {
        match *self {
            Guide::Vertical(x) => Line::new((x, canvas.y0), (x, canvas.y1)),
            Guide::Horizontal(y) => Line::new((canvas.x0, y), (canvas.x1, y)),
        }
    }
}

/// Edge pairs compared per axis: (active, other).
/// 0 = leading edge, 1 = centre, 2 = trailing edge.
const PAIRS: [(usize, usize); 5] = [(0, 0), (0, 2), (2, 0), (2, 2), (1, 1)];

fn x_stops(r: &Rect) -> [f64; 3] {
    [r.left(), r.center_x(), r.right()]
}

fn y_stops(r: &Rect) -> [f64; 3] {
    [r.top(), r.center_y(), r.bottom()]
}

fn push_unique(guides: &mut Vec<Guide>, guide: Guide) {
    if !guides.contains(&guide) {
        guides.push(guide);
    }
}

/// Guides for `active` against `others` and the centre of `canvas`.
///
/// A guide is placed at the other object's coordinate whenever the distance
/// is strictly below `threshold`.
pub fn find_guides(active: Rect, others: &[Rect], canvas: Rect, threshold: f64) -> Vec<Guide> {
    let mut guides = Vec::new();
    let (ax, ay) = (x_stops(&active), y_stops(&active));

    for other in others {
        let (ox, oy) = (x_stops(other), y_stops(other));
        for (a, o) in PAIRS {
            if (ax[a] - ox[o]).abs() < threshold {
                push_unique(&mut guides, Guide::Vertical(ox[o]));
            }
            if (ay[a] - oy[o]).abs() < threshold {
                push_unique(&mut guides, Guide::Horizontal(oy[o]));
            }
        }
    }

    if (active.center_x() - canvas.center_x()).abs() < threshold {
        push_unique(&mut guides, Guide::Vertical(canvas.center_x()));
    }
    if (active.center_y() - canvas.center_y()).abs() < threshold {
        push_unique(&mut guides, Guide::Horizontal(canvas.center_y()));
    }

    guides
}

/// Offset that puts the nearest edge or centre of `active` onto a guide.
///
/// Each axis is resolved independently; the first of several equally near
/// matches wins.
pub fn guide_offset(active: Rect, guides: &[Guide]) -> Vec2 {
    let (ax, ay) = (x_stops(&active), y_stops(&active));
    let mut best_x: Option<f64> = None;
    let mut best_y: Option<f64> = None;

    let consider = |best: &mut Option<f64>, stops: &[f64; 3], target: f64| {
        for stop in stops {
            let delta = target - stop;
            if best.is_none_or(|b| delta.abs() < b.abs()) {
                *best = Some(delta);
            }
        }
    };

    for guide in guides {
        match *guide {
            Guide::Vertical(x) => consider(&mut best_x, &ax, x),
            Guide::Horizontal(y) => consider(&mut best_y, &ay, y),
        }
    }

    Vec2::new(best_x.unwrap_or(0.0), best_y.unwrap_or(0.0))
}

/// Move `active` onto the nearest of `guides`; returns the applied offset.
pub fn snap_to_guides(active: &mut SceneObject, guides: &[Guide]) -> Vec2 {
    let delta = guide_offset(active.bounds(), guides);
    if delta != Vec2::ZERO {
        log::debug!("Snapped {} to guides by ({:.2}, {:.2})", active.id(), delta.x, delta.y);
        active.translate(delta);
    }
    delta
}

/// Guide state for one drag gesture.
#[derive(Debug, Clone)]
pub struct GuideEngine {
    canvas: Rect,
    threshold: f64,
    guides: Vec<Guide>,
}

impl GuideEngine {
    pub fn new(canvas: Rect, threshold: f64) -> Self {
        Self {
            canvas,
            threshold,
            guides: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Compute guides without storing them.
    pub fn find_guides(&self, active: Rect, others: &[Rect]) -> Vec<Guide> {
        find_guides(active, others, self.canvas, self.threshold)
    }

    /// Recompute the frame's guides for `active` against `others`.
    pub fn update<'a>(
        &mut self,
        active: &SceneObject,
        others: impl IntoIterator<Item = &'a SceneObject>,
    ) -> &[Guide] {
        let others: Vec<Rect> = others
            .into_iter()
            .filter(|o| o.id() != active.id())
            .map(SceneObject::bounds)
            .collect();
        self.guides = self.find_guides(active.bounds(), &others);
        &self.guides
    }

    /// Snap `active` onto the current guides.
    pub fn snap_to_guides(&self, active: &mut SceneObject) -> Vec2 {
        snap_to_guides(active, &self.guides)
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Drop the guides of the last frame.
    pub fn clear(&mut self) {
        self.guides.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);

    #[test]
    fn test_right_to_left_guide_snaps_exactly() {
        let mut a = SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = SceneObject::rectangle(Rect::new(53.0, 200.0, 100.0, 250.0));
        let guides = find_guides(a.bounds(), &[b.bounds()], CANVAS, DEFAULT_THRESHOLD);
        assert_eq!(guides, vec![Guide::Vertical(53.0)]);

        snap_to_guides(&mut a, &guides);
        assert_eq!(a.bounds().right(), b.bounds().left());
    }

    #[test]
    fn test_threshold_is_strict() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(55.0, 300.0, 100.0, 350.0);
        let guides = find_guides(a, &[b], CANVAS, 5.0);
        assert!(guides.is_empty());
    }

    #[test]
    fn test_center_to_center() {
        let a = Rect::new(0.0, 100.0, 40.0, 140.0);
        let b = Rect::new(200.0, 98.0, 300.0, 138.0);
        let guides = find_guides(a, &[b], CANVAS, 5.0);
        // top-top, bottom-bottom and centre-centre all sit 2 units off.
        assert!(guides.contains(&Guide::Horizontal(98.0)));
        assert!(guides.contains(&Guide::Horizontal(118.0)));
        assert!(guides.contains(&Guide::Horizontal(138.0)));
    }

    #[test]
    fn test_canvas_center_guide() {
        let a = Rect::new(478.0, 10.0, 518.0, 30.0);
        let guides = find_guides(a, &[], CANVAS, 5.0);
        assert_eq!(guides, vec![Guide::Vertical(500.0)]);
        let delta = guide_offset(a, &guides);
        assert_eq!(delta, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_snaps_to_some_valid_guide_on_tie() {
        let mut a = SceneObject::rectangle(Rect::new(10.0, 0.0, 20.0, 10.0));
        let guides = [Guide::Vertical(8.0), Guide::Vertical(22.0)];
        snap_to_guides(&mut a, &guides);
        let b = a.bounds();
        assert!(b.left() == 8.0 || b.right() == 22.0);
    }

    #[test]
    fn test_no_guides_no_motion() {
        let mut a = SceneObject::rectangle(Rect::new(10.0, 0.0, 20.0, 10.0));
        assert_eq!(snap_to_guides(&mut a, &[]), Vec2::ZERO);
        assert_eq!(a.bounds().left(), 10.0);
    }

    #[test]
    fn test_engine_lifecycle() {
        let active = SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0));
        let sibling = SceneObject::rectangle(Rect::new(52.0, 400.0, 90.0, 450.0));
        let objects = vec![active.clone(), sibling];
        let mut engine = GuideEngine::new(CANVAS, DEFAULT_THRESHOLD);
        let found = engine.update(&active, &objects).to_vec();
        assert_eq!(found, vec![Guide::Vertical(52.0)]);
        assert_eq!(engine.guides().len(), 1);
        engine.clear();
        assert!(engine.guides().is_empty());
    }

    #[test]
    fn test_guide_line_spans_canvas() {
        let line = Guide::Horizontal(20.0).line(CANVAS);
        assert_eq!(line.p0, kurbo::Point::new(0.0, 20.0));
        assert_eq!(line.p1, kurbo::Point::new(1000.0, 20.0));
    }
}
