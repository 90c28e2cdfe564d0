//! Snapping engine.
//!
//! Picks at most one correction per axis: the closest pair of reference
//! lines (moving box vs. sibling box) under the threshold. Axes are resolved
//! independently. Ties keep the first pair found, iterating siblings in list
//! order and lines in `[start, centre, end] x [start, centre, end]` order.

use crate::id::ElementId;
use crate::model::{Bounds, CanvasElement, StageSize};
use serde::Serialize;

/// Snapped position in the node's native anchor space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapPosition {
    pub new_x: f64,
    pub new_y: f64,
    pub snapped_x: bool,
    pub snapped_y: bool,
}

/// Best correction found so far on one axis.
#[derive(Debug)]
struct AxisSnap {
    threshold: f64,
    best: f64,
    shift: Option<f64>,
}

impl AxisSnap {
    fn new(threshold: f64) -> Self {
        Self {
            threshold,
            best: f64::INFINITY,
            shift: None,
        }
    }

    fn consider(&mut self, current: &[f64; 3], others: &[f64]) {
        for &line in current {
            for &other in others {
                let d = (line - other).abs();
                if d < self.threshold && d < self.best {
                    self.best = d;
                    self.shift = Some(other - line);
                }
            }
        }
    }
}

fn snap_candidates<'a>(
    elements: &'a [CanvasElement],
    current: ElementId,
) -> impl Iterator<Item = Bounds> + 'a {
    elements
        .iter()
        .filter(move |e| e.visible && e.id != current)
        .map(CanvasElement::bounding_box)
}

fn resolve(
    node_box: &Bounds,
    x: AxisSnap,
    y: AxisSnap,
    offset_x: f64,
    offset_y: f64,
) -> SnapPosition {
    let position = SnapPosition {
        new_x: node_box.x + x.shift.unwrap_or(0.0) + offset_x,
        new_y: node_box.y + y.shift.unwrap_or(0.0) + offset_y,
        snapped_x: x.shift.is_some(),
        snapped_y: y.shift.is_some(),
    };
    if position.snapped_x || position.snapped_y {
        log::trace!(
            "snap ({}, {}) -> ({}, {})",
            node_box.x + offset_x,
            node_box.y + offset_y,
            position.new_x,
            position.new_y
        );
    }
    position
}

/// Snap a moving node against its siblings.
///
/// `node_box` is the moving node's bounding box; `offset_x/offset_y` lead
/// from that box's top-left to the node's reported position (see
/// `CanvasElement::snap_offset`). Without a snap the result is the unchanged
/// reported position.
pub fn calculate_snapping_position(
    node_box: &Bounds,
    elements: &[CanvasElement],
    current: ElementId,
    snap_threshold: f64,
    offset_x: f64,
    offset_y: f64,
) -> SnapPosition {
    let mut x = AxisSnap::new(snap_threshold);
    let mut y = AxisSnap::new(snap_threshold);
    let vertical = node_box.vertical_lines();
    let horizontal = node_box.horizontal_lines();

    for other in snap_candidates(elements, current) {
        x.consider(&vertical, &other.vertical_lines());
        y.consider(&horizontal, &other.horizontal_lines());
    }

    resolve(node_box, x, y, offset_x, offset_y)
}

/// Like [`calculate_snapping_position`], with the stage's centre lines as a
/// final candidate after every sibling.
pub fn calculate_snapping_position_on_stage(
    node_box: &Bounds,
    elements: &[CanvasElement],
    current: ElementId,
    stage: StageSize,
    snap_threshold: f64,
    offset_x: f64,
    offset_y: f64,
) -> SnapPosition {
    let mut x = AxisSnap::new(snap_threshold);
    let mut y = AxisSnap::new(snap_threshold);
    let vertical = node_box.vertical_lines();
    let horizontal = node_box.horizontal_lines();

    for other in snap_candidates(elements, current) {
        x.consider(&vertical, &other.vertical_lines());
        y.consider(&horizontal, &other.horizontal_lines());
    }
    let (cx, cy) = stage.center();
    x.consider(&vertical, &[cx]);
    y.consider(&horizontal, &[cy]);

    resolve(node_box, x, y, offset_x, offset_y)
}
