//! Undo/Redo command stack.
//!
//! Single element updates are recorded as the element before and after the
//! merge, so undo restores exactly what was there. Gestures and structural
//! edits (delete, canvas resize) use **snapshot batching**: the document is
//! captured as MessagePack at the start and end of the batch, and undo/redo
//! swaps the whole document in a single step.

use crate::store::{Document, ElementStore};
use lk_core::id::ElementId;
use lk_core::model::{CanvasElement, ElementUpdate};

#[derive(Debug, Clone)]
pub enum Command {
    /// One merged update, as the element before and after.
    Single {
        id: ElementId,
        before: Box<CanvasElement>,
        after: Box<CanvasElement>,
        description: String,
    },
    /// Whole-document snapshots around a batch.
    Snapshot {
        before: Vec<u8>,
        after: Vec<u8>,
        description: String,
    },
}

/// Undo/redo stacks with batch grouping for gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    batch_snapshot: Option<Vec<u8>>,
    batch_description: String,
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
            batch_dirty: false,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Start a batch. Updates until the matching `end_batch` are applied
    /// live and become one undo step.
    pub fn begin_batch(&mut self, doc: &Document, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = match doc.to_snapshot() {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("undo snapshot failed: {e}");
                    None
                }
            };
            self.batch_description = description.to_string();
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch. The outermost close pushes one snapshot command if the
    /// document actually changed.
    pub fn end_batch(&mut self, doc: &Document) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }

        let before = self.batch_snapshot.take();
        let dirty = std::mem::replace(&mut self.batch_dirty, false);
        let Some(before) = before.filter(|_| dirty) else {
            return;
        };
        match doc.to_snapshot() {
            Ok(after) if after != before => {
                let description = std::mem::take(&mut self.batch_description);
                self.push(Command::Snapshot {
                    before,
                    after,
                    description,
                });
            }
            Ok(_) => {}
            Err(e) => log::warn!("undo snapshot failed: {e}"),
        }
    }

    /// Abandon the current batch, restoring the document to its state at
    /// `begin_batch`. Nothing is pushed.
    pub fn cancel_batch(&mut self, doc: &mut Document) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth = 0;
        let dirty = std::mem::replace(&mut self.batch_dirty, false);
        if let Some(before) = self.batch_snapshot.take().filter(|_| dirty) {
            if let Err(e) = doc.restore(&before) {
                log::warn!("failed to roll back cancelled gesture: {e}");
            }
        }
    }

    /// Merge `update` into the document and record it. Returns `false` when
    /// the element no longer exists; nothing is recorded then.
    pub fn execute(&mut self, doc: &mut Document, update: &ElementUpdate, description: &str) -> bool {
        let Some(before) = doc.element(update.id).cloned() else {
            log::debug!("{description}: element {} is gone", update.id);
            return false;
        };
        doc.merge_update(update);

        if self.batch_depth > 0 {
            self.batch_dirty = true;
            return true;
        }

        let Some(after) = doc.element(update.id).cloned() else {
            return false;
        };
        if after != before {
            self.push(Command::Single {
                id: update.id,
                before: Box::new(before),
                after: Box::new(after),
                description: description.to_string(),
            });
        }
        true
    }

    /// Run a structural edit as one undo step. `edit` returns whether it
    /// changed anything.
    pub fn record(
        &mut self,
        doc: &mut Document,
        description: &str,
        edit: impl FnOnce(&mut Document, &mut Self) -> bool,
    ) -> bool {
        self.begin_batch(doc, description);
        let changed = edit(doc, self);
        if changed {
            self.batch_dirty = true;
        }
        self.end_batch(doc);
        changed
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        let desc = match &cmd {
            Command::Single {
                id,
                before,
                description,
                ..
            } => {
                if !doc.replace(*before.clone()) {
                    log::warn!("undo: element {id} is missing");
                }
                description.clone()
            }
            Command::Snapshot {
                before,
                description,
                ..
            } => {
                if let Err(e) = doc.restore(before) {
                    log::warn!("undo: {e}");
                }
                description.clone()
            }
        };
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        let desc = match &cmd {
            Command::Single {
                id,
                after,
                description,
                ..
            } => {
                if !doc.replace(*after.clone()) {
                    log::warn!("redo: element {id} is missing");
                }
                description.clone()
            }
            Command::Snapshot {
                after, description, ..
            } => {
                if let Err(e) = doc.restore(after) {
                    log::warn!("redo: {e}");
                }
                description.clone()
            }
        };
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lk_core::model::{Rectangle, Shape, StageSize};
    use pretty_assertions::assert_eq;

    fn doc_with_box() -> (Document, ElementId) {
        let mut doc = Document::new(StageSize::new(800.0, 600.0));
        let id = ElementId::intern("cmd_box");
        doc.insert(CanvasElement::new(
            id,
            0.0,
            0.0,
            Shape::Rectangle(Rectangle {
                width: 100.0,
                height: 50.0,
                corner_radius: 0.0,
            }),
        ));
        (doc, id)
    }

    fn x_of(doc: &Document, id: ElementId) -> f64 {
        doc.element(id).map(|e| e.x).unwrap_or(f64::NAN)
    }

    #[test]
    fn undo_redo_single_update() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(100);

        stack.execute(&mut doc, &ElementUpdate::new(id).with_position(50.0, 30.0), "Move box");
        assert_eq!(x_of(&doc, id), 50.0);

        assert_eq!(stack.undo(&mut doc), Some("Move box".to_string()));
        assert_eq!(x_of(&doc, id), 0.0);

        assert_eq!(stack.redo(&mut doc), Some("Move box".to_string()));
        assert_eq!(x_of(&doc, id), 50.0);
    }

    #[test]
    fn new_update_discards_redo() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(100);

        stack.execute(&mut doc, &ElementUpdate::new(id).with_position(5.0, 0.0), "move");
        stack.undo(&mut doc);
        assert!(stack.can_redo());

        stack.execute(&mut doc, &ElementUpdate::new(id).with_position(1.0, 0.0), "move2");
        assert!(!stack.can_redo());
    }

    #[test]
    fn history_is_bounded() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(3);
        for i in 0..5 {
            stack.execute(
                &mut doc,
                &ElementUpdate::new(id).with_position(f64::from(i + 1), 0.0),
                "move",
            );
        }
        let mut undo_count = 0;
        while stack.undo(&mut doc).is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
    }

    #[test]
    fn missing_element_is_not_recorded() {
        let (mut doc, _) = doc_with_box();
        let mut stack = CommandStack::new(10);
        let ghost = ElementUpdate::new(ElementId::intern("cmd_ghost")).with_position(1.0, 1.0);
        assert!(!stack.execute(&mut doc, &ghost, "ghost"));
        assert!(!stack.can_undo());
    }

    #[test]
    fn batch_undo_is_single_step() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(100);

        stack.begin_batch(&doc, "drag");
        for i in 1..=5 {
            let x = f64::from(i) * 10.0;
            stack.execute(&mut doc, &ElementUpdate::new(id).with_position(x, x / 2.0), "drag");
        }
        stack.end_batch(&doc);

        assert_eq!(stack.undo(&mut doc), Some("drag".to_string()));
        assert_eq!(x_of(&doc, id), 0.0);
        assert!(!stack.can_undo());

        stack.redo(&mut doc);
        assert_eq!(x_of(&doc, id), 50.0);
    }

    #[test]
    fn unchanged_gesture_records_nothing() {
        let (doc, _) = doc_with_box();
        let mut stack = CommandStack::new(100);
        stack.begin_batch(&doc, "noop");
        stack.end_batch(&doc);
        assert!(!stack.can_undo());
    }

    #[test]
    fn cancel_batch_rolls_back() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(100);
        stack.begin_batch(&doc, "drag");
        stack.execute(&mut doc, &ElementUpdate::new(id).with_position(99.0, 0.0), "drag");
        stack.cancel_batch(&mut doc);
        assert_eq!(x_of(&doc, id), 0.0);
        assert!(!stack.can_undo());
        assert!(!stack.is_batching());
    }

    #[test]
    fn record_wraps_structural_edit() {
        let (mut doc, id) = doc_with_box();
        let mut stack = CommandStack::new(100);
        assert!(stack.record(&mut doc, "delete", |doc, _| doc.remove(id).is_some()));
        assert!(doc.element(id).is_none());
        stack.undo(&mut doc);
        assert!(doc.element(id).is_some());
    }
}
