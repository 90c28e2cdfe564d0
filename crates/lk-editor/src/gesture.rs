//! Drag gesture state.
//!
//! A [`DragGesture`] is created by `drag_start`, threaded through every
//! `drag_move` and consumed by `drag_end` or `drag_cancel`. The coordinator
//! only remembers which gesture is live.

use lk_core::frame::DropTarget;
use lk_core::guides::GuideLine;
use lk_core::id::ElementId;
use lk_core::model::{Bounds, CanvasElement, ElementUpdate};
use serde::Serialize;
use smallvec::SmallVec;

/// Interaction family of the dragged element.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureKind {
    /// Shapes, text, icons and groups: guides on move, snap on end.
    Simple,
    /// A frame. Its hosted image, if any, follows on every move.
    Frame {
        origin: (f64, f64),
        hosted: Option<(ElementId, (f64, f64))>,
    },
    /// A freestanding image, possibly hovering over a frame it could drop
    /// into. The frame link is only written on drag end.
    FreeImage { target: Option<DropTarget> },
    /// An image hosted by a frame. Rigid images carry their frame along;
    /// movable ones slide inside the clip region.
    HostedImage {
        frame_id: ElementId,
        movable: bool,
        origin: (f64, f64),
        frame_origin: (f64, f64),
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub id: ElementId,
    pub kind: GestureKind,
    /// Issued by `drag_start`; a gesture superseded by a newer one is inert.
    pub(crate) serial: u64,
}

impl DragGesture {
    /// Classify a drag of `element`. `movable` is the image's movable-mode
    /// flag, ignored for anything but hosted images.
    pub fn classify(
        element: &CanvasElement,
        elements: &[CanvasElement],
        movable: bool,
    ) -> Self {
        let kind = if element.is_frame() {
            GestureKind::Frame {
                origin: (element.x, element.y),
                hosted: elements
                    .iter()
                    .find(|e| e.is_image() && e.frame_id == Some(element.id))
                    .map(|img| (img.id, (img.x, img.y))),
            }
        } else if element.is_image() {
            match element
                .frame_id
                .and_then(|f| elements.iter().find(|e| e.id == f))
            {
                Some(frame) => GestureKind::HostedImage {
                    frame_id: frame.id,
                    movable,
                    origin: (element.x, element.y),
                    frame_origin: (frame.x, frame.y),
                },
                None => GestureKind::FreeImage { target: None },
            }
        } else {
            GestureKind::Simple
        };
        Self {
            id: element.id,
            kind,
            serial: 0,
        }
    }
}

/// What the host renders while a drag is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragFeedback {
    pub guides: Vec<GuideLine>,
    /// Where the dragged image would land (drop preview), or where a movable
    /// hosted image is clamped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Bounds>,
    /// Updates already committed during this move (rigid followers).
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub committed: SmallVec<[ElementUpdate; 2]>,
}
