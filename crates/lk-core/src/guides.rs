//! Alignment guide generator.
//!
//! Runs on every drag-move and returns every relation under the threshold,
//! not just the closest one; the renderer draws them all. Sibling boxes come
//! from the rendering layer through [`SceneLookup`], so guides follow what is
//! on screen rather than stored geometry.

use crate::id::ElementId;
use crate::model::{Bounds, CanvasElement, StageSize};
use serde::Serialize;
use std::collections::HashMap;

/// Guides appear for relations strictly closer than this many pixels.
pub const GUIDE_THRESHOLD: f64 = 4.0;

/// Distance between a matched line and its delta label.
const LABEL_GAP: f64 = 4.0;

/// Which pair of lines a guide aligns (moving element first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuideKind {
    LeftToLeft,
    RightToRight,
    TopToTop,
    BottomToBottom,
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
    CenterXToCenterX,
    CenterYToCenterY,
    CenterXToLeft,
    CenterXToRight,
    CenterYToTop,
    CenterYToBottom,
    StageCenterX,
    StageCenterY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// Constant x, spans the stage height.
    Vertical,
    /// Constant y, spans the stage width.
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuideLabel {
    /// Pixel delta between the two matched lines, rounded.
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideLine {
    pub kind: GuideKind,
    pub orientation: GuideOrientation,
    /// The shared coordinate: x for vertical guides, y for horizontal ones.
    pub position: f64,
    /// `[x1, y1, x2, y2]` in stage space.
    pub points: [f64; 4],
    pub label: GuideLabel,
    /// The sibling aligned to; `None` for stage guides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementId>,
}

// ─── Scene lookup ────────────────────────────────────────────────────────

/// Rendered bounding box of an element by id, as the renderer currently
/// shows it. `None` when the element has no rendered node.
pub trait SceneLookup {
    fn rendered_bounds(&self, id: ElementId) -> Option<Bounds>;
}

impl SceneLookup for HashMap<ElementId, Bounds> {
    fn rendered_bounds(&self, id: ElementId) -> Option<Bounds> {
        self.get(&id).copied()
    }
}

/// Falls back to stored geometry, for hosts that do not report rendered boxes.
#[derive(Debug, Clone, Copy)]
pub struct StoredBounds<'a>(pub &'a [CanvasElement]);

impl SceneLookup for StoredBounds<'_> {
    fn rendered_bounds(&self, id: ElementId) -> Option<Bounds> {
        self.0
            .iter()
            .find(|e| e.id == id)
            .map(CanvasElement::bounding_box)
    }
}

// ─── Generation ──────────────────────────────────────────────────────────

struct GuideSink<'a> {
    node: &'a Bounds,
    stage: StageSize,
    threshold: f64,
    guides: Vec<GuideLine>,
}

impl GuideSink<'_> {
    fn check(
        &mut self,
        kind: GuideKind,
        orientation: GuideOrientation,
        moving: f64,
        other: f64,
        target: Option<ElementId>,
    ) {
        let delta = (moving - other).abs();
        if delta >= self.threshold {
            return;
        }
        // Midway between the two lines, so dragging either element of a
        // matched pair draws the guide in the same place.
        let position = (moving + other) / 2.0;
        self.push(kind, orientation, position, delta, target);
    }

    fn push(
        &mut self,
        kind: GuideKind,
        orientation: GuideOrientation,
        position: f64,
        delta: f64,
        target: Option<ElementId>,
    ) {
        let (points, label_x, label_y) = match orientation {
            GuideOrientation::Vertical => (
                [position, 0.0, position, self.stage.height],
                position + LABEL_GAP,
                self.node.top() - LABEL_GAP,
            ),
            GuideOrientation::Horizontal => (
                [0.0, position, self.stage.width, position],
                self.node.left() - LABEL_GAP,
                position + LABEL_GAP,
            ),
        };
        self.guides.push(GuideLine {
            kind,
            orientation,
            position,
            points,
            label: GuideLabel {
                text: format!("{delta:.0}"),
                x: label_x,
                y: label_y,
            },
            target,
        });
    }

    fn sibling(&mut self, id: ElementId, other: &Bounds) {
        use GuideKind::*;
        use GuideOrientation::{Horizontal as H, Vertical as V};
        let n = *self.node;
        let t = Some(id);

        self.check(LeftToLeft, V, n.left(), other.left(), t);
        self.check(RightToRight, V, n.right(), other.right(), t);
        self.check(TopToTop, H, n.top(), other.top(), t);
        self.check(BottomToBottom, H, n.bottom(), other.bottom(), t);
        self.check(TopToBottom, H, n.top(), other.bottom(), t);
        self.check(BottomToTop, H, n.bottom(), other.top(), t);
        self.check(LeftToRight, V, n.left(), other.right(), t);
        self.check(RightToLeft, V, n.right(), other.left(), t);
        self.check(CenterXToCenterX, V, n.center_x(), other.center_x(), t);
        self.check(CenterYToCenterY, H, n.center_y(), other.center_y(), t);
        self.check(CenterXToLeft, V, n.center_x(), other.left(), t);
        self.check(CenterXToRight, V, n.center_x(), other.right(), t);
        self.check(CenterYToTop, H, n.center_y(), other.top(), t);
        self.check(CenterYToBottom, H, n.center_y(), other.bottom(), t);
    }

    fn stage_center(&mut self) {
        let (cx, cy) = self.stage.center();
        let n = *self.node;
        // Stage guides sit exactly on the stage centre.
        let dx = (n.center_x() - cx).abs();
        if dx < self.threshold {
            self.push(GuideKind::StageCenterX, GuideOrientation::Vertical, cx, dx, None);
        }
        let dy = (n.center_y() - cy).abs();
        if dy < self.threshold {
            self.push(GuideKind::StageCenterY, GuideOrientation::Horizontal, cy, dy, None);
        }
    }
}

/// Guides for `moving` with its box at `node_box`, at [`GUIDE_THRESHOLD`].
pub fn calculate_guidelines(
    node_box: &Bounds,
    moving: ElementId,
    elements: &[CanvasElement],
    stage: StageSize,
    lookup: &impl SceneLookup,
) -> Vec<GuideLine> {
    calculate_guidelines_with_threshold(node_box, moving, elements, stage, lookup, GUIDE_THRESHOLD)
}

/// Guides for `moving` against every visible sibling with a rendered node,
/// followed by the two stage-centre checks.
///
/// Siblings exclude the moving element, the image it hosts and the frame
/// hosting it; those move with it.
pub fn calculate_guidelines_with_threshold(
    node_box: &Bounds,
    moving: ElementId,
    elements: &[CanvasElement],
    stage: StageSize,
    lookup: &impl SceneLookup,
    threshold: f64,
) -> Vec<GuideLine> {
    let host = elements
        .iter()
        .find(|e| e.id == moving)
        .and_then(|e| e.frame_id);

    let mut sink = GuideSink {
        node: node_box,
        stage,
        threshold,
        guides: Vec::new(),
    };

    for element in elements {
        if !element.visible
            || element.id == moving
            || element.frame_id == Some(moving)
            || Some(element.id) == host
        {
            continue;
        }
        let Some(rendered) = lookup.rendered_bounds(element.id) else {
            continue;
        };
        sink.sibling(element.id, &rendered);
    }
    sink.stage_center();

    log::trace!("{} guides for {moving}", sink.guides.len());
    sink.guides
}
