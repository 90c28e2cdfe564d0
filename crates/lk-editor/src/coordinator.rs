//! Element update coordinator.
//!
//! Owns the document, the undo history and the engine configuration, and
//! turns renderer events (drag, transform, text edits, canvas resize) into
//! canonical element updates. Every commit:
//!
//! - carries percent mirrors computed from the *current* stage size,
//! - re-checks that the element still exists (updates for deleted ids are
//!   dropped),
//! - goes through [`CommandStack`] so it can be undone.
//!
//! While a drag is in flight nothing is committed except rigid followers
//! (the image of a dragged frame, the frame of a dragged rigid image).
//! Those live in an open undo batch that belongs to the drag alone: any
//! other edit first rolls the followers back and closes the batch, and the
//! drag reopens it on its next move.

use crate::commands::CommandStack;
use crate::gesture::{DragFeedback, DragGesture, GestureKind};
use crate::store::{Document, ElementStore};
use lk_core::branding::ResolvedStyle;
use lk_core::config::EngineConfig;
use lk_core::document::Design;
use lk_core::frame::{
    clamp_image_offset, find_drop_target, follow_frame, frame_occupant, place_in_frame,
    refit_after_frame_resize, refit_hosted_images, rescale_frame_for_image,
};
use lk_core::geometry::{TransformResult, anchor_for_box_origin};
use lk_core::guides::{SceneLookup, calculate_guidelines_with_threshold};
use lk_core::id::ElementId;
use lk_core::model::{
    Bounds, CanvasElement, ElementKind, ElementUpdate, FrameLink, NodeState, StageSize,
};
use lk_core::percent::mirror_for;
use lk_core::rescale::rescale;
use lk_core::snap::{calculate_snapping_position, calculate_snapping_position_on_stage};

pub struct Coordinator {
    document: Document,
    history: CommandStack,
    config: EngineConfig,
    /// Hosted image currently in movable mode, if any.
    movable: Option<ElementId>,
    /// Serial of the drag between `drag_start` and `drag_end`/`drag_cancel`.
    live_gesture: Option<u64>,
    /// Whether the live drag's undo batch is open.
    gesture_batch: bool,
    gesture_serial: u64,
}

impl Coordinator {
    pub fn new(stage: StageSize, config: EngineConfig) -> Self {
        Self::from_design(Design::new(stage), config)
    }

    pub fn from_design(design: Design, config: EngineConfig) -> Self {
        Self {
            document: Document::from_design(design),
            history: CommandStack::new(config.undo_depth),
            config,
            movable: None,
            live_gesture: None,
            gesture_batch: false,
            gesture_serial: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn movable(&self) -> Option<ElementId> {
        self.movable
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the document, dropping history and movable mode.
    pub fn load(&mut self, design: Design) {
        self.document = Document::from_design(design);
        self.history = CommandStack::new(self.config.undo_depth);
        self.movable = None;
        self.live_gesture = None;
        self.gesture_batch = false;
    }

    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        if self.movable.is_some() && self.movable != id {
            self.movable = None;
        }
        self.document.select(id)
    }

    pub fn resolved_style(&self, id: ElementId) -> Option<ResolvedStyle> {
        self.document.design().resolved_style(id)
    }

    /// Insert a new element on top, with percent mirrors for the current
    /// stage. Returns `false` if the id is taken.
    pub fn add_element(&mut self, mut element: CanvasElement) -> bool {
        element.percent = mirror_for(&element, self.document.stage());
        element.selected = false;
        self.settle_gesture();
        self.history
            .record(&mut self.document, "Add element", |doc, _| doc.insert(element))
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    /// Begin dragging `id`. Selects it and opens an undo batch that the
    /// matching `drag_end` closes (or `drag_cancel` rolls back).
    pub fn drag_start(&mut self, id: ElementId) -> Option<DragGesture> {
        if let Some(stale) = self.live_gesture {
            log::warn!("drag of {id} started while gesture {stale} is open; rolling it back");
            self.settle_gesture();
            self.live_gesture = None;
        }
        let element = self.document.element(id)?;
        let mut gesture = DragGesture::classify(
            element,
            self.document.elements(),
            self.movable == Some(id),
        );
        self.gesture_serial += 1;
        gesture.serial = self.gesture_serial;
        self.live_gesture = Some(gesture.serial);

        self.document.select(Some(id));
        self.history.begin_batch(&self.document, "Move");
        self.gesture_batch = true;
        log::debug!("drag start {id}: {:?}", gesture.kind);
        Some(gesture)
    }

    /// Whether `gesture` is the live drag. Reopens its batch if an edit
    /// closed it since the last move.
    fn claim(&mut self, gesture: &DragGesture) -> bool {
        if self.live_gesture != Some(gesture.serial) {
            log::debug!("ignoring finished or superseded drag of {}", gesture.id);
            return false;
        }
        if !self.gesture_batch {
            self.history.begin_batch(&self.document, "Move");
            self.gesture_batch = true;
        }
        true
    }

    /// Roll back the live drag's uncommitted followers and close its batch,
    /// so the next edit is recorded against a document without them.
    fn settle_gesture(&mut self) {
        if std::mem::take(&mut self.gesture_batch) {
            self.history.cancel_batch(&mut self.document);
        }
    }

    /// Guides and previews for the node's current position. Only rigid
    /// followers are committed.
    pub fn drag_move(
        &mut self,
        gesture: &mut DragGesture,
        node: &NodeState,
        scene: &impl SceneLookup,
    ) -> DragFeedback {
        if !self.claim(gesture) {
            return DragFeedback::default();
        }
        let Some(element) = self.document.element(gesture.id).cloned() else {
            log::trace!("drag move for deleted element {}", gesture.id);
            return DragFeedback::default();
        };
        let stage = self.document.stage();
        let node_box = element.bounding_box_at(node);
        let mut feedback = DragFeedback {
            guides: calculate_guidelines_with_threshold(
                &node_box,
                element.id,
                self.document.elements(),
                stage,
                scene,
                self.config.guide_threshold,
            ),
            ..DragFeedback::default()
        };

        match &mut gesture.kind {
            GestureKind::Simple => {}
            GestureKind::Frame { origin, hosted } => {
                if let Some((image, image_origin)) = *hosted {
                    let dropped = element.apply_drag(node, stage);
                    let delta = delta_from(&dropped, *origin);
                    if let Some(update) = self.follow(image, image_origin, delta) {
                        feedback.committed.push(update);
                    }
                }
            }
            GestureKind::FreeImage { target } => {
                let found = find_drop_target(self.document.elements(), element.id, node_box.center());
                if target.is_none()
                    && let Some(t) = &found
                {
                    log::trace!("{} entered frame {}", element.id, t.frame_id);
                }
                feedback.preview = found.as_ref().map(|t| t.image_box());
                *target = found;
            }
            GestureKind::HostedImage {
                frame_id,
                movable: false,
                origin,
                frame_origin,
            } => {
                let dropped = element.apply_drag(node, stage);
                let delta = delta_from(&dropped, *origin);
                if let Some(update) = self.follow(*frame_id, *frame_origin, delta) {
                    feedback.committed.push(update);
                }
            }
            GestureKind::HostedImage {
                frame_id,
                movable: true,
                ..
            } => {
                if let Some(frame) = self.document.element(*frame_id) {
                    let (x, y) = clamp_image_offset(&frame.bounding_box(), &node_box);
                    feedback.preview = Some(Bounds::new(x, y, node_box.width, node_box.height));
                }
            }
        }
        feedback
    }

    /// Commit the drag and close its undo batch. Returns the update committed
    /// for the dragged element itself, or `None` if it no longer exists.
    pub fn drag_end(&mut self, gesture: DragGesture, node: &NodeState) -> Option<ElementUpdate> {
        if !self.claim(&gesture) {
            return None;
        }
        let committed = self.commit_drag(&gesture, node);
        self.history.end_batch(&self.document);
        self.gesture_batch = false;
        self.live_gesture = None;
        committed
    }

    /// Abandon the drag, rolling back what it committed. Edits made while
    /// it was in flight are kept.
    pub fn drag_cancel(&mut self, gesture: DragGesture) {
        if self.live_gesture != Some(gesture.serial) {
            log::debug!("cancel of finished or superseded drag of {}", gesture.id);
            return;
        }
        log::debug!("drag cancel {}", gesture.id);
        self.settle_gesture();
        self.live_gesture = None;
    }

    fn commit_drag(&mut self, gesture: &DragGesture, node: &NodeState) -> Option<ElementUpdate> {
        let Some(element) = self.document.element(gesture.id).cloned() else {
            log::debug!("drag end for deleted element {}", gesture.id);
            return None;
        };
        let stage = self.document.stage();

        let update = match &gesture.kind {
            GestureKind::Simple => {
                let snapped = self.snap(&element, node, None);
                element.apply_drag(&snapped, stage)
            }
            GestureKind::Frame { origin, hosted } => {
                let snapped = self.snap(&element, node, hosted.map(|(image, _)| image));
                let update = element.apply_drag(&snapped, stage);
                if let Some((image, image_origin)) = *hosted {
                    self.follow(image, image_origin, delta_from(&update, *origin));
                }
                update
            }
            GestureKind::FreeImage { .. } => {
                let center = element.bounding_box_at(node).center();
                let placed = find_drop_target(self.document.elements(), element.id, center)
                    .and_then(|t| self.document.element(t.frame_id))
                    .and_then(|frame| place_in_frame(&element, frame, stage));
                match placed {
                    Some(update) => {
                        log::debug!("{} dropped into frame", element.id);
                        update
                    }
                    None => element
                        .apply_drag(node, stage)
                        .with_frame(FrameLink::Detach),
                }
            }
            GestureKind::HostedImage {
                frame_id,
                movable: false,
                origin,
                frame_origin,
            } => {
                let update = element.apply_drag(node, stage);
                self.follow(*frame_id, *frame_origin, delta_from(&update, *origin));
                update
            }
            GestureKind::HostedImage {
                frame_id,
                movable: true,
                ..
            } => {
                let clamped = self.document.element(*frame_id).map(|frame| {
                    clamp_image_offset(&frame.bounding_box(), &element.bounding_box_at(node))
                });
                match clamped {
                    Some((left, top)) => {
                        let (ax, ay) = anchor_for_box_origin(&element, left, top);
                        element.apply_drag(&NodeState { x: ax, y: ay, ..*node }, stage)
                    }
                    None => element.apply_drag(node, stage),
                }
            }
        };

        self.history
            .execute(&mut self.document, &update, "Move")
            .then_some(update)
    }

    /// Snap the node position against siblings, and the stage centre when
    /// configured. `companion` moves with the element and is never a
    /// candidate.
    fn snap(
        &self,
        element: &CanvasElement,
        node: &NodeState,
        companion: Option<ElementId>,
    ) -> NodeState {
        let node_box = element.bounding_box_at(node);
        let (ox, oy) = element.snap_offset();
        let candidates: Vec<CanvasElement>;
        let elements = match companion {
            Some(skip) => {
                candidates = self
                    .document
                    .elements()
                    .iter()
                    .filter(|e| e.id != skip)
                    .cloned()
                    .collect();
                &candidates[..]
            }
            None => self.document.elements(),
        };

        let threshold = self.config.snap_threshold;
        let snap = if self.config.snap_to_stage_center {
            calculate_snapping_position_on_stage(
                &node_box,
                elements,
                element.id,
                self.document.stage(),
                threshold,
                ox,
                oy,
            )
        } else {
            calculate_snapping_position(&node_box, elements, element.id, threshold, ox, oy)
        };
        if snap.snapped_x || snap.snapped_y {
            log::trace!("{} snapped to ({}, {})", element.id, snap.new_x, snap.new_y);
        }
        NodeState {
            x: snap.new_x,
            y: snap.new_y,
            ..*node
        }
    }

    /// Move a rigidly attached element to `origin + delta` and commit it.
    fn follow(
        &mut self,
        id: ElementId,
        origin: (f64, f64),
        delta: (f64, f64),
    ) -> Option<ElementUpdate> {
        let mut base = self.document.element(id)?.clone();
        base.x = origin.0;
        base.y = origin.1;
        let update = follow_frame(&base, delta.0, delta.1, self.document.stage());
        self.history
            .execute(&mut self.document, &update, "Move")
            .then_some(update)
    }

    // ─── Transform ───────────────────────────────────────────────────────

    /// Fold the renderer's transient scale into the element's stored size.
    /// The returned node state (unit scale) must be applied to the rendered
    /// node. Frames re-fit their image; hosted images rescale their frame.
    pub fn transform_end(&mut self, id: ElementId, node: &NodeState) -> Option<TransformResult> {
        self.settle_gesture();
        let element = self.document.element(id)?.clone();
        let stage = self.document.stage();
        let result = element.apply_transform(node, stage);

        self.history.begin_batch(&self.document, "Transform");
        self.history.execute(&mut self.document, &result.update, "Transform");

        if let Some(next) = self.document.element(id).cloned() {
            if next.is_frame() {
                let refit = frame_occupant(self.document.elements(), id)
                    .and_then(|image| self.document.element(image))
                    .and_then(|image| refit_after_frame_resize(image, &next, stage));
                if let Some(update) = refit {
                    self.history.execute(&mut self.document, &update, "Transform");
                }
            } else if let Some(frame) = next.frame_id.and_then(|f| self.document.element(f)) {
                let update = frame_to_box(
                    frame,
                    rescale_frame_for_image(
                        &frame.bounding_box(),
                        &element.bounding_box(),
                        &next.bounding_box(),
                    ),
                    stage,
                );
                self.history.execute(&mut self.document, &update, "Transform");
            }
        }

        self.history.end_batch(&self.document);
        Some(result)
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Commit edited text content. Dropped if the element was deleted while
    /// the editor overlay was open, or is not a text element.
    pub fn commit_text(&mut self, id: ElementId, text: &str) -> bool {
        self.settle_gesture();
        let Some(element) = self.document.element(id) else {
            log::debug!("text commit for deleted element {id}");
            return false;
        };
        if element.kind() != ElementKind::Text {
            log::warn!("text commit for non-text element {id}");
            return false;
        }
        let mut update = ElementUpdate::new(id);
        update.text = Some(text.to_string());
        let mut next = element.clone();
        update.apply_to(&mut next);
        update.percent = mirror_for(&next, self.document.stage());
        self.history.execute(&mut self.document, &update, "Edit text")
    }

    pub fn delete_element(&mut self, id: ElementId) -> bool {
        if self.movable == Some(id) {
            self.movable = None;
        }
        self.settle_gesture();
        self.history
            .record(&mut self.document, "Delete", |doc, _| doc.remove(id).is_some())
    }

    /// Resize the canvas, rescaling every element to the new aspect ratio.
    /// Hosted images are re-fitted to their rescaled frames. Non-positive
    /// sizes are ignored.
    pub fn resize_canvas(&mut self, width: f64, height: f64) -> bool {
        let new = StageSize::new(width, height);
        if !new.is_valid() {
            log::warn!("ignoring canvas resize to {width}x{height}");
            return false;
        }
        let old = self.document.stage();
        if old == new {
            return false;
        }
        log::debug!("canvas resize {}x{} -> {width}x{height}", old.width, old.height);
        self.settle_gesture();
        self.history.record(&mut self.document, "Resize canvas", |doc, _| {
            let mut rescaled = rescale(doc.elements(), old, new);
            let refit = refit_hosted_images(&mut rescaled, new);
            log::trace!("re-fitted {} hosted images", refit.len());
            doc.design_mut().elements = rescaled;
            doc.set_stage(new);
            doc.design_mut().refresh_percent();
            true
        })
    }

    /// Toggle movable mode for a hosted image. Returns whether the image is
    /// movable afterwards.
    pub fn toggle_movable(&mut self, id: ElementId) -> bool {
        if self.movable == Some(id) {
            self.movable = None;
            return false;
        }
        let hosted = self
            .document
            .element(id)
            .is_some_and(|e| e.is_image() && e.frame_id.is_some());
        self.movable = hosted.then_some(id);
        hosted
    }

    pub fn undo(&mut self) -> Option<String> {
        if self.live_gesture.is_some() || self.history.is_batching() {
            return None;
        }
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> Option<String> {
        if self.live_gesture.is_some() || self.history.is_batching() {
            return None;
        }
        self.history.redo(&mut self.document)
    }
}

fn delta_from(update: &ElementUpdate, origin: (f64, f64)) -> (f64, f64) {
    (
        update.x.map_or(0.0, |x| x - origin.0),
        update.y.map_or(0.0, |y| y - origin.1),
    )
}

fn frame_to_box(frame: &CanvasElement, target: Bounds, stage: StageSize) -> ElementUpdate {
    let mut update = ElementUpdate::new(frame.id)
        .with_position(target.x, target.y)
        .with_size(target.width, target.height);
    let mut next = frame.clone();
    update.apply_to(&mut next);
    update.percent = mirror_for(&next, stage);
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::frame::FitMode;
    use lk_core::guides::StoredBounds;
    use lk_core::model::{Circle, Frame, Image, Rectangle, Shape, Text};
    use pretty_assertions::assert_eq;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
        CanvasElement::new(
            ElementId::intern(id),
            x,
            y,
            Shape::Rectangle(Rectangle {
                width: w,
                height: h,
                corner_radius: 0.0,
            }),
        )
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(StageSize::new(1000.0, 1000.0), EngineConfig::default())
    }

    #[test]
    fn simple_drag_commits_position_and_percent() {
        let mut c = coordinator();
        let id = ElementId::intern("co_rect");
        c.add_element(rect("co_rect", 100.0, 100.0, 150.0, 100.0));

        let gesture = c.drag_start(id).unwrap();
        let update = c.drag_end(gesture, &NodeState::at(300.0, 200.0)).unwrap();
        assert_eq!((update.x, update.y), (Some(300.0), Some(200.0)));
        assert_eq!(update.percent.x, Some(0.3));

        let el = c.document().element(id).unwrap();
        assert_eq!((el.x, el.y), (300.0, 200.0));
        assert!(el.selected);
    }

    #[test]
    fn drag_end_snaps_to_sibling() {
        let mut c = coordinator();
        c.add_element(rect("co_anchor", 0.0, 0.0, 100.0, 40.0));
        c.add_element(rect("co_mover", 300.0, 600.0, 30.0, 30.0));
        let id = ElementId::intern("co_mover");

        let gesture = c.drag_start(id).unwrap();
        let update = c.drag_end(gesture, &NodeState::at(103.0, 600.0)).unwrap();
        assert_eq!(update.x, Some(100.0));
    }

    #[test]
    fn drag_of_deleted_element_commits_nothing() {
        let mut c = coordinator();
        let id = ElementId::intern("co_gone");
        c.add_element(rect("co_gone", 0.0, 0.0, 10.0, 10.0));
        let mut gesture = c.drag_start(id).unwrap();
        c.document.remove(id);

        let feedback = c.drag_move(&mut gesture, &NodeState::at(5.0, 5.0), &StoredBounds(&[]));
        assert_eq!(feedback, DragFeedback::default());
        assert_eq!(c.drag_end(gesture, &NodeState::at(5.0, 5.0)), None);
        assert!(!c.history.is_batching());
    }

    #[test]
    fn cancel_restores_followers() {
        let mut c = coordinator();
        let frame = CanvasElement::new(
            ElementId::intern("co_frame"),
            0.0,
            0.0,
            Shape::Frame(Frame {
                width: 100.0,
                height: 100.0,
                fit_mode: FitMode::Fill,
            }),
        );
        let mut image = CanvasElement::new(
            ElementId::intern("co_photo"),
            0.0,
            0.0,
            Shape::Image(Image {
                src: "p.png".into(),
                width: 100.0,
                height: 100.0,
                original_width: Some(100.0),
                original_height: Some(100.0),
            }),
        );
        image.frame_id = Some(frame.id);
        c.add_element(frame.clone());
        c.add_element(image.clone());

        let mut gesture = c.drag_start(frame.id).unwrap();
        let feedback = c.drag_move(&mut gesture, &NodeState::at(40.0, 10.0), &StoredBounds(&[]));
        assert_eq!(feedback.committed.len(), 1);
        assert_eq!(c.document().element(image.id).unwrap().x, 40.0);

        c.drag_cancel(gesture);
        assert_eq!(c.document().element(image.id).unwrap().x, 0.0);
    }

    #[test]
    fn superseded_gesture_is_inert() {
        let mut c = coordinator();
        c.add_element(rect("co_first", 0.0, 0.0, 10.0, 10.0));
        c.add_element(rect("co_second", 500.0, 500.0, 10.0, 10.0));
        let old = c.drag_start(ElementId::intern("co_first")).unwrap();
        let held = old.clone();
        c.drag_cancel(old);
        let live = c.drag_start(ElementId::intern("co_second")).unwrap();

        assert_eq!(c.drag_end(held.clone(), &NodeState::at(300.0, 300.0)), None);
        c.drag_cancel(held);
        assert!(c.history.is_batching());
        assert!(c.drag_end(live, &NodeState::at(600.0, 600.0)).is_some());
        assert_eq!(c.document().element(ElementId::intern("co_first")).unwrap().x, 0.0);
        assert_eq!(c.undo().as_deref(), Some("Move"));
    }

    #[test]
    fn text_commit_checks_existence_and_kind() {
        let mut c = coordinator();
        let label = ElementId::intern("co_label");
        c.add_element(CanvasElement::new(
            label,
            10.0,
            10.0,
            Shape::Text(Text {
                text: "Hi".into(),
                width: 100.0,
                height: 20.0,
                font_size: 16.0,
                font_family: None,
            }),
        ));
        c.add_element(CanvasElement::new(
            ElementId::intern("co_dot"),
            0.0,
            0.0,
            Shape::Circle(Circle { radius: 4.0 }),
        ));

        assert!(c.commit_text(label, "Hello"));
        assert!(!c.commit_text(ElementId::intern("co_dot"), "nope"));
        c.delete_element(label);
        assert!(!c.commit_text(label, "late"));
    }

    #[test]
    fn resize_rejects_invalid_sizes() {
        let mut c = coordinator();
        assert!(!c.resize_canvas(0.0, 500.0));
        assert!(!c.resize_canvas(f64::NAN, 500.0));
        assert_eq!(c.document().stage(), StageSize::new(1000.0, 1000.0));
        assert!(!c.can_undo());
    }

    #[test]
    fn movable_only_for_hosted_images() {
        let mut c = coordinator();
        c.add_element(rect("co_plain", 0.0, 0.0, 10.0, 10.0));
        assert!(!c.toggle_movable(ElementId::intern("co_plain")));
        assert_eq!(c.movable(), None);
    }
}
