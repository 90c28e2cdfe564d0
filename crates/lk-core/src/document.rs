//! Design documents: the stage, the brand kit and the stacked element list.
//!
//! JSON is the import/export format; MessagePack snapshots back the undo
//! stack. Import normalises the frame relationship instead of rejecting it:
//! the first image claiming a frame keeps it.

use crate::branding::{Branding, ResolvedStyle, resolve_style};
use crate::frame::frame_occupant;
use crate::id::ElementId;
use crate::model::{CanvasElement, StageSize};
use crate::percent::mirror_for;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid design JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode snapshot: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),
    #[error("duplicate element id `{0}`")]
    DuplicateId(String),
    #[error("invalid stage size {width}x{height}")]
    InvalidStage { width: f64, height: f64 },
}

/// A complete design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub stage: StageSize,
    #[serde(default)]
    pub branding: Branding,
    /// Stacking order: last is topmost.
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
}

impl Design {
    pub fn new(stage: StageSize) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.elements.iter().find(|e| e.selected).map(|e| e.id)
    }

    /// Effective style of an element with branding references resolved.
    pub fn resolved_style(&self, id: ElementId) -> Option<ResolvedStyle> {
        self.element(id).map(|e| resolve_style(e, &self.branding))
    }

    /// Parse and normalise a design.
    ///
    /// # Errors
    /// Malformed JSON, an invalid stage or a duplicate element id.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let mut design: Design = serde_json::from_str(json)?;
        design.normalize()?;
        log::debug!(
            "loaded design {}x{} with {} elements",
            design.stage.width,
            design.stage.height,
            design.elements.len()
        );
        Ok(design)
    }

    /// # Errors
    /// Only if serialization itself fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compact binary snapshot for the undo stack.
    ///
    /// # Errors
    /// Only if encoding fails.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// # Errors
    /// Corrupt or foreign snapshot bytes.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Recompute every percent mirror against the current stage.
    pub fn refresh_percent(&mut self) {
        if !self.stage.is_valid() {
            return;
        }
        for element in &mut self.elements {
            element.percent = mirror_for(element, self.stage);
        }
    }

    /// Enforce the document invariants.
    ///
    /// Hard errors: invalid stage, duplicate ids. Policy fixes: `frameId`
    /// that points at a missing frame or sits on a non-image is cleared, a
    /// frame claimed by several images keeps the first, and at most one
    /// element stays selected.
    ///
    /// # Errors
    /// [`DocumentError::InvalidStage`] or [`DocumentError::DuplicateId`].
    pub fn normalize(&mut self) -> Result<(), DocumentError> {
        if !self.stage.is_valid() {
            return Err(DocumentError::InvalidStage {
                width: self.stage.width,
                height: self.stage.height,
            });
        }

        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(DocumentError::DuplicateId(element.id.as_str().to_owned()));
            }
        }

        let owners: HashMap<ElementId, Option<ElementId>> = self
            .elements
            .iter()
            .filter(|e| e.is_frame())
            .map(|e| (e.id, frame_occupant(&self.elements, e.id)))
            .collect();

        for element in &mut self.elements {
            let Some(frame) = element.frame_id else {
                continue;
            };
            let Some(owner) = owners.get(&frame).filter(|_| element.is_image()) else {
                log::warn!("{}: dropping frameId `{frame}`, no such frame", element.id);
                element.frame_id = None;
                continue;
            };
            if *owner != Some(element.id) {
                log::warn!(
                    "{}: frame `{frame}` is already hosting another image",
                    element.id
                );
                element.frame_id = None;
            }
        }

        let mut selected = false;
        for element in &mut self.elements {
            if element.selected {
                if selected {
                    element.selected = false;
                }
                selected = true;
            }
        }

        Ok(())
    }
}
