//! Element store: the single writer for element state.
//!
//! Everything the coordinator commits goes through [`ElementStore`], with
//! merge-by-id semantics. Updates for ids that no longer exist are dropped.

use lk_core::document::{Design, DocumentError};
use lk_core::frame::orphan_updates;
use lk_core::id::ElementId;
use lk_core::model::{CanvasElement, ElementUpdate, StageSize};

/// Action-based state container the coordinator commits to.
pub trait ElementStore {
    fn stage(&self) -> StageSize;

    /// All elements in stacking order.
    fn elements(&self) -> &[CanvasElement];

    fn element(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements().iter().find(|e| e.id == id)
    }

    /// Merge a partial update. Returns `false` (and changes nothing) when the
    /// id is unknown.
    fn merge_update(&mut self, update: &ElementUpdate) -> bool;

    /// Append on top. Returns `false` if the id is already taken.
    fn insert(&mut self, element: CanvasElement) -> bool;

    /// Remove by id. Images hosted by a removed frame are orphaned, not
    /// removed.
    fn remove(&mut self, id: ElementId) -> Option<CanvasElement>;

    fn set_stage(&mut self, stage: StageSize);
}

/// The in-memory document backing the editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    design: Design,
}

impl Document {
    pub fn new(stage: StageSize) -> Self {
        Self::from_design(Design::new(stage))
    }

    pub fn from_design(design: Design) -> Self {
        Self { design }
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn design_mut(&mut self) -> &mut Design {
        &mut self.design
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.design.selected()
    }

    /// Select exactly `id`, or nothing. Returns `false` if `id` is unknown,
    /// in which case the selection is cleared.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        let mut found = false;
        for element in &mut self.design.elements {
            element.selected = Some(element.id) == id;
            found |= element.selected;
        }
        found || id.is_none()
    }

    /// Replace an element wholesale, keeping its stacking position and the
    /// current selection.
    pub fn replace(&mut self, element: CanvasElement) -> bool {
        match self.design.element_mut(element.id) {
            Some(slot) => {
                let selected = slot.selected;
                *slot = element;
                slot.selected = selected;
                true
            }
            None => false,
        }
    }

    /// # Errors
    /// Only if snapshot encoding fails.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, DocumentError> {
        self.design.to_snapshot()
    }

    /// Replace the whole document with a snapshot.
    ///
    /// # Errors
    /// Corrupt snapshot bytes; the document is left unchanged.
    pub fn restore(&mut self, snapshot: &[u8]) -> Result<(), DocumentError> {
        self.design = Design::from_snapshot(snapshot)?;
        Ok(())
    }
}

impl ElementStore for Document {
    fn stage(&self) -> StageSize {
        self.design.stage
    }

    fn elements(&self) -> &[CanvasElement] {
        &self.design.elements
    }

    fn merge_update(&mut self, update: &ElementUpdate) -> bool {
        match self.design.element_mut(update.id) {
            Some(element) => {
                update.apply_to(element);
                true
            }
            None => {
                log::debug!("dropping update for missing element {}", update.id);
                false
            }
        }
    }

    fn insert(&mut self, element: CanvasElement) -> bool {
        if self.design.element(element.id).is_some() {
            log::warn!("element {} already exists", element.id);
            return false;
        }
        self.design.elements.push(element);
        true
    }

    fn remove(&mut self, id: ElementId) -> Option<CanvasElement> {
        let index = self.design.elements.iter().position(|e| e.id == id)?;
        let removed = self.design.elements.remove(index);
        if removed.is_frame() {
            for update in orphan_updates(&self.design.elements, id) {
                log::debug!("orphaning {} from deleted frame {id}", update.id);
                self.merge_update(&update);
            }
        }
        Some(removed)
    }

    fn set_stage(&mut self, stage: StageSize) {
        self.design.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::frame::FitMode;
    use lk_core::model::{Circle, Frame, Image, Shape};
    use pretty_assertions::assert_eq;

    fn circle(id: &str) -> CanvasElement {
        CanvasElement::new(
            ElementId::intern(id),
            0.0,
            0.0,
            Shape::Circle(Circle { radius: 5.0 }),
        )
    }

    #[test]
    fn merge_unknown_id_is_dropped() {
        let mut doc = Document::new(StageSize::default());
        let update = ElementUpdate::new(ElementId::intern("st_ghost")).with_position(1.0, 1.0);
        assert!(!doc.merge_update(&update));
        assert!(doc.elements().is_empty());
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut doc = Document::new(StageSize::default());
        assert!(doc.insert(circle("st_dup")));
        assert!(!doc.insert(circle("st_dup")));
        assert_eq!(doc.elements().len(), 1);
    }

    #[test]
    fn selection_is_exclusive() {
        let mut doc = Document::new(StageSize::default());
        doc.insert(circle("st_a"));
        doc.insert(circle("st_b"));
        assert!(doc.select(Some(ElementId::intern("st_a"))));
        assert!(doc.select(Some(ElementId::intern("st_b"))));
        assert_eq!(doc.selected(), Some(ElementId::intern("st_b")));
        assert_eq!(doc.elements().iter().filter(|e| e.selected).count(), 1);
        assert!(!doc.select(Some(ElementId::intern("st_missing"))));
        assert_eq!(doc.selected(), None);
    }

    #[test]
    fn removing_frame_orphans_image() {
        let mut doc = Document::new(StageSize::default());
        let frame = ElementId::intern("st_frame");
        doc.insert(CanvasElement::new(
            frame,
            0.0,
            0.0,
            Shape::Frame(Frame {
                width: 100.0,
                height: 100.0,
                fit_mode: FitMode::Fill,
            }),
        ));
        let mut photo = CanvasElement::new(
            ElementId::intern("st_photo"),
            0.0,
            0.0,
            Shape::Image(Image {
                src: "p.png".into(),
                width: 100.0,
                height: 100.0,
                original_width: None,
                original_height: None,
            }),
        );
        photo.frame_id = Some(frame);
        doc.insert(photo);

        assert!(doc.remove(frame).is_some());
        let photo = doc.element(ElementId::intern("st_photo")).unwrap();
        assert_eq!(photo.frame_id, None);
        assert_eq!(doc.elements().len(), 1);
    }

    #[test]
    fn snapshot_restore() {
        let mut doc = Document::new(StageSize::new(500.0, 500.0));
        doc.insert(circle("st_snap"));
        let bytes = doc.to_snapshot().unwrap();
        doc.remove(ElementId::intern("st_snap"));
        doc.restore(&bytes).unwrap();
        assert_eq!(doc.elements().len(), 1);
    }
}
