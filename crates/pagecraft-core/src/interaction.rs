//! Interactive move, resize and rotate gestures.
//!
//! A session remembers the object as it was when the gesture began. Every
//! pointer move recomputes the target from that original plus the pointer
//! delta, so snapping never accumulates error across frames.

use crate::config::EngineConfig;
use crate::guides::{Guide, GuideEngine, guide_offset};
use crate::scene::SceneGraph;
use crate::shapes::{ObjectId, SceneObject};
use crate::snap::{SnapMode, snap_angle, snap_position, snap_scaled_size};
use kurbo::{Point, Size, Vec2};

/// State of an active move of a single object.
#[derive(Debug, Clone)]
pub struct DragSession {
    object_id: ObjectId,
    /// Starting point of the drag.
    start_point: Point,
    /// Original object state for recomputation and cancel.
    original: SceneObject,
    guides: GuideEngine,
    mode: SnapMode,
    grid_size: f64,
}

impl DragSession {
    /// Begin dragging `id`; `None` if the page has no such object.
    pub fn begin(
        page: &SceneGraph,
        id: ObjectId,
        start_point: Point,
        config: &EngineConfig,
    ) -> Option<Self> {
        let original = page.get(id)?.clone();
        Some(Self {
            object_id: id,
            start_point,
            original,
            guides: GuideEngine::new(page.canvas(), config.guide_threshold),
            mode: config.snap_mode,
            grid_size: config.grid_size,
        })
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Move the object to follow the pointer and return this frame's guides.
    ///
    /// Grid snapping applies first; on an axis where a guide matches, the
    /// guide wins.
    pub fn update(&mut self, page: &mut SceneGraph, point: Point) -> &[Guide] {
        let mut candidate = self.original.clone();
        candidate.translate(point - self.start_point);

        let grid_delta = if self.mode.snaps_to_grid() {
            let mut gridded = candidate.clone();
            snap_position(&mut gridded, self.grid_size)
        } else {
            Vec2::ZERO
        };

        let mut delta = grid_delta;
        if self.mode.snaps_to_guides() {
            let guides = self.guides.update(&candidate, page.objects());
            let guide_delta = guide_offset(candidate.bounds(), guides);
            if guides.iter().any(|g| matches!(g, Guide::Vertical(_))) {
                delta.x = guide_delta.x;
            }
            if guides.iter().any(|g| matches!(g, Guide::Horizontal(_))) {
                delta.y = guide_delta.y;
            }
        } else {
            self.guides.clear();
        }
        candidate.translate(delta);

        if let Some(live) = page.get_mut(self.object_id) {
            live.geometry = candidate.geometry;
        }
        self.guides.guides()
    }

    pub fn guides(&self) -> &[Guide] {
        self.guides.guides()
    }

    /// Finish the gesture, keeping the object where it is.
    pub fn end(mut self) {
        self.guides.clear();
        log::debug!("Drag of {} ended", self.object_id);
    }

    /// Abort the gesture, restoring the original placement.
    pub fn cancel(self, page: &mut SceneGraph) {
        if let Some(live) = page.get_mut(self.object_id) {
            live.geometry = self.original.geometry;
        }
    }
}

/// State of an active resize of a single object.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    object_id: ObjectId,
    original: SceneObject,
    snap_to_grid: bool,
    grid_size: f64,
}

impl ResizeSession {
    pub fn begin(page: &SceneGraph, id: ObjectId, config: &EngineConfig) -> Option<Self> {
        let original = page.get(id)?.clone();
        Some(Self {
            object_id: id,
            original,
            snap_to_grid: config.snap_mode.snaps_to_grid(),
            grid_size: config.grid_size,
        })
    }

    /// Resize to a proposed scaled size by adjusting the scale factors.
    ///
    /// Returns the committed scaled size.
    pub fn update(&mut self, page: &mut SceneGraph, proposed: Size) -> Size {
        let mut geometry = self.original.geometry;
        let local = geometry.size();
        if local.width > 0.0 {
            geometry.scale.x = proposed.width.max(0.0) / local.width;
        }
        if local.height > 0.0 {
            geometry.scale.y = proposed.height.max(0.0) / local.height;
        }
        if self.snap_to_grid {
            snap_scaled_size(&mut geometry, self.grid_size);
        }
        if let Some(live) = page.get_mut(self.object_id) {
            live.geometry = geometry;
        }
        geometry.scaled_size()
    }

    pub fn cancel(self, page: &mut SceneGraph) {
        if let Some(live) = page.get_mut(self.object_id) {
            live.geometry = self.original.geometry;
        }
    }
}

/// State of an active rotation of a single object.
#[derive(Debug, Clone)]
pub struct RotateSession {
    object_id: ObjectId,
    original_rotation: f64,
    /// `None` when snapping is off.
    increment: Option<f64>,
}

impl RotateSession {
    pub fn begin(page: &SceneGraph, id: ObjectId, config: &EngineConfig) -> Option<Self> {
        let original_rotation = page.get(id)?.geometry.rotation();
        Some(Self {
            object_id: id,
            original_rotation,
            increment: config.snap_mode.is_enabled().then_some(config.angle_increment),
        })
    }

    /// Rotate by `delta` degrees from the starting angle, snapping to the
    /// configured increment. Returns the committed rotation.
    pub fn update(&mut self, page: &mut SceneGraph, delta: f64) -> f64 {
        let target = self.original_rotation + delta;
        let rotation = match self.increment {
            Some(increment) => snap_angle(target, increment),
            None => target,
        };
        match page.get_mut(self.object_id) {
            Some(live) => {
                live.geometry.set_rotation(rotation);
                live.geometry.rotation()
            }
            None => rotation,
        }
    }

    pub fn cancel(self, page: &mut SceneGraph) {
        if let Some(live) = page.get_mut(self.object_id) {
            live.geometry.set_rotation(self.original_rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Edges;
    use kurbo::Rect;

    fn config(mode: SnapMode) -> EngineConfig {
        EngineConfig {
            snap_mode: mode,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_drag_without_snapping() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let mut drag = DragSession::begin(&page, id, Point::new(10.0, 10.0), &config(SnapMode::None)).unwrap();
        let guides = drag.update(&mut page, Point::new(17.0, 23.0)).len();
        assert_eq!(guides, 0);
        let b = page.get(id).unwrap().bounds();
        assert_eq!((b.left(), b.top()), (7.0, 13.0));
    }

    #[test]
    fn test_drag_grid_snaps() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let mut drag = DragSession::begin(&page, id, Point::ZERO, &config(SnapMode::Grid)).unwrap();
        drag.update(&mut page, Point::new(27.0, 52.0));
        let b = page.get(id).unwrap().bounds();
        assert_eq!((b.left(), b.top()), (20.0, 60.0));
    }

    #[test]
    fn test_guides_beat_grid() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        page.add(SceneObject::rectangle(Rect::new(133.0, 400.0, 180.0, 450.0)));
        let mut drag = DragSession::begin(&page, id, Point::ZERO, &config(SnapMode::All)).unwrap();

        // Right edge lands at 131, two units from the sibling's left edge.
        let guides = drag.update(&mut page, Point::new(81.0, 12.0)).to_vec();
        assert!(guides.contains(&Guide::Vertical(133.0)));
        let b = page.get(id).unwrap().bounds();
        assert_eq!(b.right(), 133.0);
        // No horizontal guide, so y falls back to the grid.
        assert_eq!(b.top(), 20.0);
    }

    #[test]
    fn test_drag_recomputes_from_original() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut drag = DragSession::begin(&page, id, Point::ZERO, &config(SnapMode::Grid)).unwrap();
        drag.update(&mut page, Point::new(9.0, 0.0));
        drag.update(&mut page, Point::new(9.0, 0.0));
        assert_eq!(page.get(id).unwrap().bounds().left(), 0.0);
        drag.end();
    }

    #[test]
    fn test_cancel_restores() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(5.0, 5.0, 15.0, 15.0)));
        let mut drag = DragSession::begin(&page, id, Point::ZERO, &config(SnapMode::None)).unwrap();
        drag.update(&mut page, Point::new(300.0, 300.0));
        drag.cancel(&mut page);
        assert_eq!(page.get(id).unwrap().bounds().left(), 5.0);
    }

    #[test]
    fn test_resize_snaps_scaled_size() {
        let mut page = SceneGraph::new(1000, 1000).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)));
        let mut resize = ResizeSession::begin(&page, id, &config(SnapMode::Grid)).unwrap();
        let size = resize.update(&mut page, Size::new(95.0, 33.0));
        assert!((size.width - 100.0).abs() < 1e-9);
        assert!((size.height - 40.0).abs() < 1e-9);
        let g = page.get(id).unwrap().geometry;
        assert_eq!(g.width(), 40.0);
    }

    #[test]
    fn test_begin_unknown_object() {
        let page = SceneGraph::new(100, 100).unwrap();
        let cfg = EngineConfig::default();
        assert!(DragSession::begin(&page, uuid::Uuid::new_v4(), Point::ZERO, &cfg).is_none());
        assert!(ResizeSession::begin(&page, uuid::Uuid::new_v4(), &cfg).is_none());
        assert!(RotateSession::begin(&page, uuid::Uuid::new_v4(), &cfg).is_none());
    }

    #[test]
    fn test_rotate_snaps_to_configured_increment() {
        let mut page = SceneGraph::new(200, 200).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 40.0, 20.0)));
        let cfg = EngineConfig {
            angle_increment: 45.0,
            ..config(SnapMode::Grid)
        };
        let mut rotate = RotateSession::begin(&page, id, &cfg).unwrap();
        assert!((rotate.update(&mut page, 30.0) - 45.0).abs() < 1e-9);
        assert!((rotate.update(&mut page, 100.0) - 90.0).abs() < 1e-9);
        assert!((page.get(id).unwrap().geometry.rotation() - 90.0).abs() < 1e-9);

        rotate.cancel(&mut page);
        assert_eq!(page.get(id).unwrap().geometry.rotation(), 0.0);
    }

    #[test]
    fn test_rotate_without_snapping_is_free() {
        let mut page = SceneGraph::new(200, 200).unwrap();
        let id = page.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 40.0, 20.0)));
        let mut rotate = RotateSession::begin(&page, id, &config(SnapMode::None)).unwrap();
        assert!((rotate.update(&mut page, 31.5) - 31.5).abs() < 1e-9);
    }
}
