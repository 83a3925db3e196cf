//! Grid and angle snapping for interactive move, resize and rotate.

use crate::bounds::Edges;
use crate::shapes::{Geometry, SceneObject};
use kurbo::{Line, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Smallest usable grid cell; smaller requests are clamped to this.
pub const MIN_GRID_SIZE: f64 = 1.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Snap mode for aligning objects to the grid or to smart guides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    /// No snapping.
    #[default]
    None,
    /// Snap to grid intersections.
    Grid,
    /// Snap to guides from sibling objects and the canvas centre.
    Guides,
    /// Both; guides win on an axis where one matches.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Guides,
            SnapMode::Guides => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    /// Check if grid snapping is enabled.
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    /// Check if guide snapping is enabled.
    pub fn snaps_to_guides(self) -> bool {
        matches!(self, SnapMode::Guides | SnapMode::All)
    }

    /// Check if any snapping is enabled.
    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }

    /// Offset from `from` to the snapped point.
    pub fn delta_from(&self, from: Point) -> Vec2 {
        self.point - from
    }
}

/// Clamp a requested grid size to a usable positive value.
pub fn clamp_grid(grid_size: f64) -> f64 {
    if grid_size.is_finite() {
        grid_size.max(MIN_GRID_SIZE)
    } else {
        GRID_SIZE
    }
}

/// Round `value` to the nearest multiple of `grid_size`.
pub fn snap_value(value: f64, grid_size: f64) -> f64 {
    let grid = clamp_grid(grid_size);
    (value / grid).round() * grid
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    let snapped = Point::new(snap_value(point.x, grid_size), snap_value(point.y, grid_size));
    SnapResult {
        point: snapped,
        snapped_x: snapped.x != point.x,
        snapped_y: snapped.y != point.y,
    }
}

/// Move `object` so the top-left of its bounds lies on the grid.
///
/// Returns the applied offset.
pub fn snap_position(object: &mut SceneObject, grid_size: f64) -> Vec2 {
    let bounds = object.bounds();
    let origin = Point::new(bounds.left(), bounds.top());
    let delta = snap_to_grid(origin, grid_size).delta_from(origin);
    object.translate(delta);
    delta
}

/// Snap a size to the grid; an extent that would collapse to zero keeps one
/// cell instead.
pub fn snap_size(size: Size, grid_size: f64) -> Size {
    let grid = clamp_grid(grid_size);
    let snap_extent = |v: f64| {
        let snapped = snap_value(v, grid);
        if snapped <= 0.0 { grid } else { snapped }
    };
    Size::new(snap_extent(size.width), snap_extent(size.height))
}

/// Snap the scaled size of `geometry` by adjusting its scale factors.
///
/// Zero-sized axes are left unchanged since no scale can resize them.
pub fn snap_scaled_size(geometry: &mut Geometry, grid_size: f64) {
    let target = snap_size(geometry.scaled_size(), grid_size);
    if geometry.width() > 0.0 {
        geometry.scale.x = target.width / geometry.width() * geometry.scale.x.signum();
    }
    if geometry.height() > 0.0 {
        geometry.scale.y = target.height / geometry.height() * geometry.scale.y.signum();
    }
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= 0.0 || !increment.is_finite() {
        return crate::shapes::normalize_degrees(angle_degrees);
    }
    let snapped = (angle_degrees / increment).round() * increment;
    crate::shapes::normalize_degrees(snapped)
}

impl SceneObject {
    /// Snap this object's rotation to the nearest `increment` degrees.
    pub fn snap_rotation(&mut self, increment: f64) {
        let snapped = snap_angle(self.geometry.rotation(), increment);
        self.geometry.set_rotation(snapped);
    }
}

/// Grid overlay lines covering a page of `size`.
///
/// Purely visual; snapping does not consult these.
pub fn grid_lines(size: Size, grid_size: f64) -> Vec<Line> {
    let grid = clamp_grid(grid_size);
    let columns = (size.width / grid).floor() as usize;
    let rows = (size.height / grid).floor() as usize;
    let mut lines = Vec::with_capacity(columns + rows + 2);
    for i in 0..=columns {
        let x = i as f64 * grid;
        lines.push(Line::new((x, 0.0), (x, size.height)));
    }
    for j in 0..=rows {
        let y = j as f64 * grid;
        lines.push(Line::new((0.0, y), (size.width, y)));
    }
    lines
}
