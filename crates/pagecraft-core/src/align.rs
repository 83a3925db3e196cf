//! Alignment and distribution of selections.
//!
//! Offsets are computed from bounds first and applied second, so the same
//! math backs both the object-level helpers here and the id-based operations
//! on [`SceneGraph`](crate::scene::SceneGraph).

use crate::bounds::{Edges, union};
use crate::shapes::{AnchorX, AnchorY, SceneObject};
use kurbo::{Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Axis along which objects are distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Edge or centre line used for alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignEdge {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl AlignEdge {
    pub fn axis(self) -> Axis {
        match self {
            AlignEdge::Left | AlignEdge::Center | AlignEdge::Right => Axis::Horizontal,
            AlignEdge::Top | AlignEdge::Middle | AlignEdge::Bottom => Axis::Vertical,
        }
    }

    /// Coordinate of this edge on `rect`.
    pub fn of(self, rect: &Rect) -> f64 {
        match self {
            AlignEdge::Left => rect.left(),
            AlignEdge::Center => rect.center_x(),
            AlignEdge::Right => rect.right(),
            AlignEdge::Top => rect.top(),
            AlignEdge::Middle => rect.center_y(),
            AlignEdge::Bottom => rect.bottom(),
        }
    }

    fn offset(self, amount: f64) -> Vec2 {
        match self.axis() {
            Axis::Horizontal => Vec2::new(amount, 0.0),
            Axis::Vertical => Vec2::new(0.0, amount),
        }
    }
}

/// Per-object offsets that bring each rect's `edge` onto `reference`'s.
pub fn alignment_offsets(bounds: &[Rect], edge: AlignEdge, reference: Rect) -> Vec<Vec2> {
    let target = edge.of(&reference);
    bounds.iter().map(|b| edge.offset(target - edge.of(b))).collect()
}

/// Align one object to the canvas and switch its anchor to match the edge.
pub fn align_to_canvas(object: &mut SceneObject, edge: AlignEdge, canvas: Size) {
    let reference = canvas.to_rect();
    let bounds = object.bounds();
    let target = edge.of(&reference);
    object.translate(edge.offset(target - edge.of(&bounds)));

    let geometry = &mut object.geometry;
    match edge {
        AlignEdge::Left => geometry.set_anchor_x(AnchorX::Left),
        AlignEdge::Center => geometry.set_anchor_x(AnchorX::Center),
        AlignEdge::Right => geometry.set_anchor_x(AnchorX::Right),
        AlignEdge::Top => geometry.set_anchor_y(AnchorY::Top),
        AlignEdge::Middle => geometry.set_anchor_y(AnchorY::Center),
        AlignEdge::Bottom => geometry.set_anchor_y(AnchorY::Bottom),
    }
}

/// Align a selection to its own union bounds.
///
/// A single object is aligned to the canvas instead; an empty selection is
/// left alone.
pub fn align_group(objects: &mut [&mut SceneObject], edge: AlignEdge, canvas: Size) {
    match objects {
        [] => {}
        [single] => align_to_canvas(single, edge, canvas),
        _ => {
            let bounds: Vec<Rect> = objects.iter().map(|o| o.bounds()).collect();
            let Some(reference) = union(bounds.iter().copied()) else {
                return;
            };
            for (object, delta) in objects.iter_mut().zip(alignment_offsets(&bounds, edge, reference)) {
                object.translate(delta);
            }
            log::debug!("Aligned {} objects to {:?}", objects.len(), edge);
        }
    }
}

/// Options for [`distribute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributeOptions {
    /// Refuse selections whose objects do not fit in their span.
    pub reject_overlap: bool,
}

/// What [`distribute`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeOutcome {
    /// Objects were moved to equal spacing.
    Applied,
    /// Fewer than three objects; nothing to do.
    Degenerate,
    /// The gap would be negative and overlap rejection was requested.
    Rejected,
}

fn extent(rect: &Rect, axis: Axis) -> (f64, f64) {
    match axis {
        Axis::Horizontal => (rect.left(), rect.right()),
        Axis::Vertical => (rect.top(), rect.bottom()),
    }
}

/// Offsets that space `bounds` evenly along `axis`, in input order.
///
/// The first and last objects (by leading edge) keep their positions.
pub fn distribution_offsets(
    bounds: &[Rect],
    axis: Axis,
    options: DistributeOptions,
) -> Result<Vec<Vec2>, DistributeOutcome> {
    if bounds.len() < 3 {
        return Err(DistributeOutcome::Degenerate);
    }

    let mut order: Vec<usize> = (0..bounds.len()).collect();
    order.sort_by(|&a, &b| extent(&bounds[a], axis).0.total_cmp(&extent(&bounds[b], axis).0));

    let (first, last) = (order[0], order[order.len() - 1]);
    let start = extent(&bounds[first], axis).0;
    let span = extent(&bounds[last], axis).1 - start;
    let occupied: f64 = bounds.iter().map(|b| {
        let (lead, trail) = extent(b, axis);
        trail - lead
    }).sum();
    let gap = (span - occupied) / (bounds.len() - 1) as f64;

    if gap < 0.0 && options.reject_overlap {
        return Err(DistributeOutcome::Rejected);
    }

    let mut offsets = vec![Vec2::ZERO; bounds.len()];
    let mut cursor = start;
    for index in order {
        let (lead, trail) = extent(&bounds[index], axis);
        let shift = cursor - lead;
        offsets[index] = match axis {
            Axis::Horizontal => Vec2::new(shift, 0.0),
            Axis::Vertical => Vec2::new(0.0, shift),
        };
        cursor += (trail - lead) + gap;
    }
    Ok(offsets)
}

/// Space a selection evenly along `axis`.
pub fn distribute(
    objects: &mut [&mut SceneObject],
    axis: Axis,
    options: DistributeOptions,
) -> DistributeOutcome {
    let bounds: Vec<Rect> = objects.iter().map(|o| o.bounds()).collect();
    match distribution_offsets(&bounds, axis, options) {
        Ok(offsets) => {
            for (object, delta) in objects.iter_mut().zip(offsets) {
                object.translate(delta);
            }
            log::debug!("Distributed {} objects {:?}", objects.len(), axis);
            DistributeOutcome::Applied
        }
        Err(outcome) => {
            log::debug!("Distribution skipped: {outcome:?}");
            outcome
        }
    }
}
