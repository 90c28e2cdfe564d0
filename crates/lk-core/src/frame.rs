//! Frame/image fit resolver.
//!
//! A frame clips and hosts at most one image. The image's display size and
//! position are always derived from the frame box, the image's intrinsic
//! dimensions and the frame's [`FitMode`]. Functions here return updates
//! rather than mutating elements, except [`refit_hosted_images`].

use crate::geometry::find;
use crate::id::ElementId;
use crate::model::{Bounds, CanvasElement, ElementUpdate, FrameLink, StageSize};
use crate::percent::{mirror_for, position_mirror};
use serde::{Deserialize, Serialize};

/// How an image is sized inside its frame.
///
/// The names are kept from the exported JSON format: `fill` means CSS
/// `cover`, not CSS `fill`. The CSS `fill` behaviour is `stretch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Contain: the whole image is visible, margins may remain.
    Fit,
    /// Cover: the frame is fully covered, overflow is clipped.
    #[default]
    Fill,
    /// Exactly the frame box, aspect ratio ignored.
    Stretch,
}

/// Size of the fitted image and its offset from the frame's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitPlacement {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitPlacement {
    /// Absolute image box for a frame whose box is `frame`.
    pub fn in_frame(&self, frame: &Bounds) -> Bounds {
        Bounds::new(
            frame.x + self.offset_x,
            frame.y + self.offset_y,
            self.width,
            self.height,
        )
    }
}

fn usable(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Size an image of intrinsic `intrinsic_w x intrinsic_h` into `frame` and
/// centre it.
///
/// Degenerate frames or intrinsic sizes (zero, negative, non-finite) fall
/// back to `Stretch`, since no aspect ratio can be derived from them.
pub fn compute_fit(
    frame: &Bounds,
    intrinsic_w: f64,
    intrinsic_h: f64,
    mode: FitMode,
) -> FitPlacement {
    let degenerate = !(usable(frame.width)
        && usable(frame.height)
        && usable(intrinsic_w)
        && usable(intrinsic_h));
    let mode = if degenerate { FitMode::Stretch } else { mode };

    let (width, height) = match mode {
        FitMode::Stretch => (frame.width, frame.height),
        FitMode::Fit | FitMode::Fill => {
            let frame_aspect = frame.width / frame.height;
            let image_aspect = intrinsic_w / intrinsic_h;
            let constrain_width = match mode {
                FitMode::Fit => image_aspect > frame_aspect,
                _ => image_aspect < frame_aspect,
            };
            if constrain_width {
                (frame.width, frame.width / image_aspect)
            } else {
                (frame.height * image_aspect, frame.height)
            }
        }
    };

    FitPlacement {
        width,
        height,
        offset_x: (frame.width - width) / 2.0,
        offset_y: (frame.height - height) / 2.0,
    }
}

// ─── Occupancy ───────────────────────────────────────────────────────────

/// The image hosted by `frame_id`. If an inconsistent list has several
/// claimants the first in stacking order wins.
pub fn frame_occupant(elements: &[CanvasElement], frame_id: ElementId) -> Option<ElementId> {
    elements
        .iter()
        .find(|e| e.is_image() && e.frame_id == Some(frame_id))
        .map(|e| e.id)
}

/// A frame that would accept a dragged image, with the placement the image
/// would get there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub frame_id: ElementId,
    pub frame_box: Bounds,
    pub placement: FitPlacement,
}

impl DropTarget {
    pub fn image_box(&self) -> Bounds {
        self.placement.in_frame(&self.frame_box)
    }
}

/// Frame under `point` that `image_id` may be dropped into.
///
/// The topmost visible frame containing the point is the only candidate. If
/// it already hosts a different image there is no target: the dragged image
/// stays freestanding, and frames further down are not considered.
pub fn find_drop_target(
    elements: &[CanvasElement],
    image_id: ElementId,
    point: (f64, f64),
) -> Option<DropTarget> {
    let image = find(elements, image_id)?.as_image()?;
    let frame_el = elements
        .iter()
        .rev()
        .filter(|e| e.visible && e.id != image_id)
        .find(|e| e.is_frame() && e.bounding_box().contains(point.0, point.1))?;
    let frame = frame_el.as_frame()?;

    match frame_occupant(elements, frame_el.id) {
        Some(occupant) if occupant != image_id => {
            log::trace!("frame {} is occupied by {occupant}", frame_el.id);
            return None;
        }
        _ => {}
    }

    let frame_box = frame_el.bounding_box();
    let (iw, ih) = image.intrinsic_size();
    Some(DropTarget {
        frame_id: frame_el.id,
        frame_box,
        placement: compute_fit(&frame_box, iw, ih, frame.fit_mode),
    })
}

// ─── Commits ─────────────────────────────────────────────────────────────

fn fitted_update(
    image: &CanvasElement,
    frame: &CanvasElement,
    stage: StageSize,
) -> Option<ElementUpdate> {
    let shape = image.as_image()?;
    let intrinsic = shape.intrinsic_size();
    let fit_mode = frame.as_frame()?.fit_mode;
    let frame_box = frame.bounding_box();
    let target = compute_fit(&frame_box, intrinsic.0, intrinsic.1, fit_mode).in_frame(&frame_box);

    let mut update = ElementUpdate::new(image.id)
        .with_position(target.x, target.y)
        .with_size(target.width, target.height);
    // The display size is about to change; keep the size it implied.
    if !shape.has_intrinsic() {
        update.original_width = Some(intrinsic.0);
        update.original_height = Some(intrinsic.1);
    }
    let mut next = image.clone();
    update.apply_to(&mut next);
    update.percent = mirror_for(&next, stage);
    Some(update)
}

/// Attach `image` to `frame` and fit it. `None` if either element has the
/// wrong type.
pub fn place_in_frame(
    image: &CanvasElement,
    frame: &CanvasElement,
    stage: StageSize,
) -> Option<ElementUpdate> {
    fitted_update(image, frame, stage).map(|u| u.with_frame(FrameLink::Attach(frame.id)))
}

/// Re-fit a hosted image after its frame was resized. Intrinsic dimensions
/// are unchanged, only the frame box differs.
pub fn refit_after_frame_resize(
    image: &CanvasElement,
    resized_frame: &CanvasElement,
    stage: StageSize,
) -> Option<ElementUpdate> {
    fitted_update(image, resized_frame, stage)
}

/// Re-fit every hosted image against its frame's current box, in place.
/// Returns the ids that changed.
pub fn refit_hosted_images(elements: &mut [CanvasElement], stage: StageSize) -> Vec<ElementId> {
    let scene: &[CanvasElement] = elements;
    let updates: Vec<ElementUpdate> = scene
        .iter()
        .filter(|e| e.as_frame().is_some())
        .filter_map(|frame| {
            let occupant = find(scene, frame_occupant(scene, frame.id)?)?;
            refit_after_frame_resize(occupant, frame, stage)
        })
        .collect();

    let mut changed = Vec::with_capacity(updates.len());
    for update in &updates {
        if let Some(image) = elements.iter_mut().find(|e| e.id == update.id) {
            update.apply_to(image);
            changed.push(update.id);
        }
    }
    changed
}

/// Translate a hosted image by the same delta as its frame.
pub fn follow_frame(image: &CanvasElement, dx: f64, dy: f64, stage: StageSize) -> ElementUpdate {
    let x = image.x + dx;
    let y = image.y + dy;
    let mut update = ElementUpdate::new(image.id).with_position(x, y);
    update.percent = position_mirror(x, y, stage);
    update
}

/// Clamp a proposed image box inside `frame` so that the image's offset
/// from the centred position never exceeds `|image - frame| / 2` per axis.
///
/// For an image larger than the frame this keeps the frame covered; for a
/// smaller one it keeps the image inside the clip region.
pub fn clamp_image_offset(frame: &Bounds, proposed: &Bounds) -> (f64, f64) {
    fn axis(frame_start: f64, frame_len: f64, start: f64, len: f64) -> f64 {
        let centred = frame_start + (frame_len - len) / 2.0;
        let slack = (len - frame_len).abs() / 2.0;
        start.clamp(centred - slack, centred + slack)
    }

    (
        axis(frame.x, frame.width, proposed.x, proposed.width),
        axis(frame.y, frame.height, proposed.y, proposed.height),
    )
}

/// New frame box after its hosted image was scaled from `before` to `after`
/// in movable mode. The frame scales by the same factors and keeps its
/// position relative to the image centre.
pub fn rescale_frame_for_image(frame: &Bounds, before: &Bounds, after: &Bounds) -> Bounds {
    fn factor(after: f64, before: f64) -> f64 {
        let f = after / before;
        if f.is_finite() && f > 0.0 { f } else { 1.0 }
    }

    let sx = factor(after.width, before.width);
    let sy = factor(after.height, before.height);
    let (bcx, bcy) = before.center();
    let (acx, acy) = after.center();

    Bounds::new(
        acx - (bcx - frame.x) * sx,
        acy - (bcy - frame.y) * sy,
        frame.width * sx,
        frame.height * sy,
    )
}

/// Detach every image hosted by `frame_id`. Used when the frame is deleted.
pub fn orphan_updates(elements: &[CanvasElement], frame_id: ElementId) -> Vec<ElementUpdate> {
    elements
        .iter()
        .filter(|e| e.frame_id == Some(frame_id))
        .map(|e| ElementUpdate::new(e.id).with_frame(FrameLink::Detach))
        .collect()
}
