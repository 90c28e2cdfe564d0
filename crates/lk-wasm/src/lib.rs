//! WASM bridge for LK: exposes the layout engine to the browser editor.
//!
//! Every call is JSON-in / JSON-out. The host renders the stage, reports
//! node positions in canvas pixels (zoom and pan already removed) and applies
//! the updates it gets back.

use std::collections::HashMap;

use lk_core::config::EngineConfig;
use lk_core::document::Design;
use lk_core::id::ElementId;
use lk_core::model::{Bounds, CanvasElement, ElementKind, NodeState, StageSize};
use lk_editor::coordinator::Coordinator;
use lk_editor::gesture::DragGesture;
use lk_editor::store::ElementStore;
use serde_json::json;
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Holds the coordinator, the in-flight drag gesture and the rendered boxes
/// the host last reported.
#[wasm_bindgen]
pub struct LayoutCanvas {
    coordinator: Coordinator,
    gesture: Option<DragGesture>,
    /// Rendered bounding boxes by id, as reported by `set_rendered_bounds`.
    rendered: HashMap<ElementId, Bounds>,
}

#[wasm_bindgen]
impl LayoutCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();

        let stage = StageSize::new(width, height);
        let stage = if stage.is_valid() {
            stage
        } else {
            log::warn!("invalid stage {width}x{height}, using default");
            StageSize::default()
        };
        Self {
            coordinator: Coordinator::new(stage, EngineConfig::default()),
            gesture: None,
            rendered: HashMap::new(),
        }
    }

    /// Replace the engine configuration from a (partial) JSON object.
    /// Loaded documents are kept; undo history starts over.
    pub fn set_config(&mut self, json: &str) -> bool {
        match serde_json::from_str::<EngineConfig>(json) {
            Ok(config) => {
                let design = self.coordinator.document().design().clone();
                self.coordinator = Coordinator::from_design(design, config);
                self.gesture = None;
                true
            }
            Err(e) => {
                log::warn!("bad config: {e}");
                false
            }
        }
    }

    /// Load a design from JSON. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"..."}`.
    pub fn load_json(&mut self, json: &str) -> String {
        match Design::from_json(json) {
            Ok(design) => {
                self.coordinator.load(design);
                self.gesture = None;
                self.rendered.clear();
                json!({ "ok": true }).to_string()
            }
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    pub fn export_json(&self) -> String {
        self.coordinator
            .document()
            .design()
            .to_json()
            .unwrap_or_else(|e| {
                log::warn!("export failed: {e}");
                "{}".to_string()
            })
    }

    /// Add one element from its JSON form. Returns `false` for malformed
    /// JSON or a taken id.
    pub fn add_element(&mut self, json: &str) -> bool {
        match serde_json::from_str::<CanvasElement>(json) {
            Ok(element) => self.coordinator.add_element(element),
            Err(e) => {
                log::warn!("bad element: {e}");
                false
            }
        }
    }

    pub fn select(&mut self, id: Option<String>) -> bool {
        self.coordinator.select(id.as_deref().map(ElementId::intern))
    }

    /// Selected element id, or `None`.
    pub fn selected(&self) -> Option<String> {
        self.coordinator
            .document()
            .selected()
            .map(|id| id.as_str().to_string())
    }

    /// Effective fill, stroke and font of an element, with branding resolved.
    pub fn resolved_style(&self, id: &str) -> String {
        self.coordinator
            .resolved_style(ElementId::intern(id))
            .and_then(|style| serde_json::to_string(&style).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Report rendered boxes as `{"id": {"x":..,"y":..,"width":..,"height":..}}`.
    /// Replaces the previous report.
    pub fn set_rendered_bounds(&mut self, json: &str) -> bool {
        match serde_json::from_str::<HashMap<ElementId, Bounds>>(json) {
            Ok(rendered) => {
                self.rendered = rendered;
                true
            }
            Err(e) => {
                log::warn!("bad rendered bounds: {e}");
                false
            }
        }
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    pub fn drag_start(&mut self, id: &str) -> bool {
        if let Some(stale) = self.gesture.take() {
            self.coordinator.drag_cancel(stale);
        }
        self.gesture = self.coordinator.drag_start(ElementId::intern(id));
        self.gesture.is_some()
    }

    /// Returns `{"guides":[...],"preview":{...},"committed":[...]}`.
    pub fn drag_move(&mut self, x: f64, y: f64) -> String {
        let Some(gesture) = self.gesture.as_mut() else {
            return r#"{"guides":[]}"#.to_string();
        };
        let feedback = self
            .coordinator
            .drag_move(gesture, &NodeState::at(x, y), &self.rendered);
        serde_json::to_string(&feedback).unwrap_or_else(|_| r#"{"guides":[]}"#.to_string())
    }

    /// Returns the committed update for the dragged element, or `null`.
    pub fn drag_end(&mut self, x: f64, y: f64) -> String {
        let update = self
            .gesture
            .take()
            .and_then(|gesture| self.coordinator.drag_end(gesture, &NodeState::at(x, y)));
        json!(update).to_string()
    }

    pub fn drag_cancel(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            self.coordinator.drag_cancel(gesture);
        }
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Fold a finished transform into the element. Returns
    /// `{"update":{...},"node":{...}}`; the host must reset its node to
    /// `node` (unit scale). `null` if the element is gone.
    pub fn transform_end(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
    ) -> String {
        let node = NodeState::at(x, y)
            .with_scale(scale_x, scale_y)
            .with_rotation(rotation);
        match self.coordinator.transform_end(ElementId::intern(id), &node) {
            Some(result) => json!({ "update": result.update, "node": result.node }).to_string(),
            None => "null".to_string(),
        }
    }

    pub fn commit_text(&mut self, id: &str, text: &str) -> bool {
        self.coordinator.commit_text(ElementId::intern(id), text)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let id = ElementId::intern(id);
        self.rendered.remove(&id);
        self.coordinator.delete_element(id)
    }

    /// Resize the canvas, rescaling every element.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.coordinator.resize_canvas(width, height)
    }

    pub fn stage_width(&self) -> f64 {
        self.coordinator.document().stage().width
    }

    pub fn stage_height(&self) -> f64 {
        self.coordinator.document().stage().height
    }

    pub fn toggle_movable(&mut self, id: &str) -> bool {
        self.coordinator.toggle_movable(ElementId::intern(id))
    }

    /// Undo the last step. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        self.coordinator.undo()
    }

    pub fn redo(&mut self) -> Option<String> {
        self.coordinator.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.coordinator.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.coordinator.can_redo()
    }
}

/// Mint a fresh id such as `rectangle_7` for a new element of type `kind`.
/// `None` for an unknown type.
#[wasm_bindgen]
pub fn next_element_id(kind: &str) -> Option<String> {
    let Some(kind) = ElementKind::from_tag(kind) else {
        log::warn!("no element type {kind:?}");
        return None;
    };
    Some(ElementId::mint(kind).as_str().to_string())
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("LK WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const DESIGN: &str = r#"{
        "stage": { "width": 1000, "height": 1000 },
        "elements": [
            { "id": "wb_box", "type": "rectangle", "x": 100, "y": 100, "width": 150, "height": 100 }
        ]
    }"#;

    #[test]
    fn load_drag_and_undo() {
        let mut canvas = LayoutCanvas::new(500.0, 500.0);
        assert_eq!(canvas.load_json(DESIGN), r#"{"ok":true}"#);

        assert!(canvas.drag_start("wb_box"));
        let feedback: Value = serde_json::from_str(&canvas.drag_move(300.0, 300.0)).unwrap();
        assert!(feedback["guides"].is_array());
        let update: Value = serde_json::from_str(&canvas.drag_end(300.0, 300.0)).unwrap();
        assert_eq!(update["x"], 300.0);
        assert_eq!(update["x_percent"], 0.3);

        assert_eq!(canvas.undo().as_deref(), Some("Move"));
        let exported: Value = serde_json::from_str(&canvas.export_json()).unwrap();
        assert_eq!(exported["elements"][0]["x"], 100.0);
    }

    #[test]
    fn bad_json_reports_error() {
        let mut canvas = LayoutCanvas::new(500.0, 500.0);
        let result: Value = serde_json::from_str(&canvas.load_json("{")).unwrap();
        assert_eq!(result["ok"], false);
        assert!(result["error"].is_string());
    }

    #[test]
    fn drag_end_without_gesture_is_null() {
        let mut canvas = LayoutCanvas::new(500.0, 500.0);
        assert_eq!(canvas.drag_end(1.0, 1.0), "null");
        assert!(!canvas.drag_start("wb_missing"));
    }

    #[test]
    fn minted_ids_can_be_added() {
        let mut canvas = LayoutCanvas::new(500.0, 500.0);
        let id = next_element_id("circle").unwrap();
        assert!(id.starts_with("circle_"));
        let json = format!(r#"{{ "id": "{id}", "type": "circle", "x": 10, "y": 10, "radius": 5 }}"#);
        assert!(canvas.add_element(&json));
        assert!(!canvas.add_element(&json));
        assert_ne!(next_element_id("circle"), Some(id));
        assert_eq!(next_element_id("blob"), None);
        assert_eq!(next_element_id(""), None);
    }

    #[test]
    fn resize_rescales() {
        let mut canvas = LayoutCanvas::new(500.0, 500.0);
        canvas.load_json(DESIGN);
        assert!(canvas.resize(2000.0, 1000.0));
        assert_eq!(canvas.stage_width(), 2000.0);
        let exported: Value = serde_json::from_str(&canvas.export_json()).unwrap();
        assert_eq!(exported["elements"][0]["x"], 200.0);
        assert_eq!(exported["elements"][0]["width"], 300.0);
    }
}
