//! Integration tests: drag and transform gestures through the coordinator.

use lk_core::document::Design;
use lk_core::frame::FitMode;
use lk_core::guides::StoredBounds;
use lk_core::id::ElementId;
use lk_core::model::*;
use lk_core::config::EngineConfig;
use lk_editor::coordinator::Coordinator;
use lk_editor::store::ElementStore;
use pretty_assertions::assert_eq;

const STAGE: StageSize = StageSize::new(1000.0, 1000.0);

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

fn frame(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    CanvasElement::new(
        ElementId::intern(id),
        x,
        y,
        Shape::Frame(Frame {
            width: w,
            height: h,
            fit_mode: FitMode::Fill,
        }),
    )
}

fn photo(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    CanvasElement::new(
        ElementId::intern(id),
        x,
        y,
        Shape::Image(Image {
            src: format!("{id}.jpg"),
            width: w,
            height: h,
            original_width: Some(400.0),
            original_height: Some(400.0),
        }),
    )
}

fn with_fit(mut el: CanvasElement, mode: FitMode) -> CanvasElement {
    if let Shape::Frame(f) = &mut el.shape {
        f.fit_mode = mode;
    }
    el
}

fn coordinator(elements: Vec<CanvasElement>) -> Coordinator {
    let mut design = Design::new(STAGE);
    design.elements = elements;
    Coordinator::from_design(design, EngineConfig::default())
}

/// A 200x100 frame at (100, 100) hosting a square image, filled.
fn hosted_pair(frame_id: &str, image_id: &str) -> Vec<CanvasElement> {
    let slot = frame(frame_id, 100.0, 100.0, 200.0, 100.0);
    let mut image = photo(image_id, 100.0, 50.0, 200.0, 200.0);
    image.frame_id = Some(slot.id);
    vec![slot, image]
}

fn at(c: &Coordinator, id: &str) -> (f64, f64) {
    c.document()
        .element(ElementId::intern(id))
        .map(|e| (e.x, e.y))
        .unwrap_or((f64::NAN, f64::NAN))
}

// ─── Free images and frames ─────────────────────────────────────────────

#[test]
fn free_image_previews_then_attaches_on_drop() {
    let mut c = coordinator(vec![
        frame("gf_slot", 100.0, 100.0, 200.0, 100.0),
        photo("gf_free", 600.0, 600.0, 50.0, 50.0),
    ]);
    let image = ElementId::intern("gf_free");
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(image).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(175.0, 125.0), &StoredBounds(&scene));
    assert_eq!(feedback.preview, Some(Bounds::new(100.0, 50.0, 200.0, 200.0)));
    assert!(feedback.committed.is_empty());
    assert_eq!(c.document().element(image).unwrap().frame_id, None);

    let update = c.drag_end(gesture, &NodeState::at(175.0, 125.0)).unwrap();
    assert_eq!(update.frame_id, Some(FrameLink::Attach(ElementId::intern("gf_slot"))));

    let placed = c.document().element(image).unwrap();
    assert_eq!(placed.frame_id, Some(ElementId::intern("gf_slot")));
    assert_eq!(placed.bounding_box(), Bounds::new(100.0, 50.0, 200.0, 200.0));
    assert_eq!(placed.percent.x, Some(0.1));
    assert_eq!(placed.percent.y, Some(0.05));
}

#[test]
fn dragging_back_out_leaves_image_free() {
    let mut c = coordinator(vec![
        frame("gf_out_slot", 100.0, 100.0, 200.0, 100.0),
        photo("gf_out_img", 600.0, 600.0, 50.0, 50.0),
    ]);
    let image = ElementId::intern("gf_out_img");
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(image).unwrap();
    let inside = c.drag_move(&mut gesture, &NodeState::at(175.0, 125.0), &StoredBounds(&scene));
    assert!(inside.preview.is_some());
    let outside = c.drag_move(&mut gesture, &NodeState::at(700.0, 20.0), &StoredBounds(&scene));
    assert_eq!(outside.preview, None);

    c.drag_end(gesture, &NodeState::at(700.0, 20.0));
    let el = c.document().element(image).unwrap();
    assert_eq!(el.frame_id, None);
    assert_eq!((el.x, el.y), (700.0, 20.0));
}

#[test]
fn occupied_frame_does_not_take_second_image() {
    let mut elements = hosted_pair("gf_busy", "gf_busy_img");
    elements.push(photo("gf_intruder", 600.0, 600.0, 50.0, 50.0));
    let mut c = coordinator(elements);
    let intruder = ElementId::intern("gf_intruder");
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(intruder).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(175.0, 125.0), &StoredBounds(&scene));
    assert_eq!(feedback.preview, None);
    c.drag_end(gesture, &NodeState::at(175.0, 125.0));

    assert_eq!(c.document().element(intruder).unwrap().frame_id, None);
    assert_eq!(at(&c, "gf_intruder"), (175.0, 125.0));
    assert_eq!(
        c.document().element(ElementId::intern("gf_busy_img")).unwrap().frame_id,
        Some(ElementId::intern("gf_busy"))
    );
}

#[test]
fn frame_drag_carries_image_and_snaps() {
    let mut elements = hosted_pair("gf_carry", "gf_carry_img");
    elements.push(rect("gf_wall", 400.0, 700.0, 50.0, 50.0));
    let mut c = coordinator(elements);
    let slot = ElementId::intern("gf_carry");
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(slot).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(203.0, 300.0), &StoredBounds(&scene));
    assert_eq!(feedback.committed.len(), 1);
    assert_eq!(at(&c, "gf_carry_img"), (203.0, 250.0));
    // The frame itself is only committed on drag end.
    assert_eq!(at(&c, "gf_carry"), (100.0, 100.0));

    // Right edge 403 snaps to the wall's left edge at 400.
    let update = c.drag_end(gesture, &NodeState::at(203.0, 300.0)).unwrap();
    assert_eq!((update.x, update.y), (Some(200.0), Some(300.0)));
    assert_eq!(at(&c, "gf_carry"), (200.0, 300.0));
    assert_eq!(at(&c, "gf_carry_img"), (200.0, 250.0));
}

#[test]
fn refit_keeps_size_implied_before_first_fit() {
    let mut raw = photo("gf_raw", 600.0, 600.0, 100.0, 100.0);
    if let Shape::Image(i) = &mut raw.shape {
        i.original_width = None;
        i.original_height = None;
    }
    let mut c = coordinator(vec![
        with_fit(frame("gf_wide", 100.0, 100.0, 200.0, 100.0), FitMode::Stretch),
        with_fit(frame("gf_square", 500.0, 100.0, 100.0, 100.0), FitMode::Fit),
        raw,
    ]);
    let image = ElementId::intern("gf_raw");

    let gesture = c.drag_start(image).unwrap();
    c.drag_end(gesture, &NodeState::at(150.0, 100.0));
    let stretched = c.document().element(image).unwrap();
    assert_eq!(stretched.bounding_box(), Bounds::new(100.0, 100.0, 200.0, 100.0));

    assert!(c.delete_element(ElementId::intern("gf_wide")));
    assert_eq!(c.document().element(image).unwrap().frame_id, None);

    let gesture = c.drag_start(image).unwrap();
    c.drag_end(gesture, &NodeState::at(450.0, 100.0));
    let placed = c.document().element(image).unwrap();
    assert_eq!(placed.frame_id, Some(ElementId::intern("gf_square")));
    assert_eq!(placed.bounding_box(), Bounds::new(500.0, 100.0, 100.0, 100.0));
}

// ─── Hosted images ──────────────────────────────────────────────────────

#[test]
fn rigid_hosted_image_drags_its_frame() {
    let mut c = coordinator(hosted_pair("gf_rigid", "gf_rigid_img"));
    let image = ElementId::intern("gf_rigid_img");
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(image).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(150.0, 60.0), &StoredBounds(&scene));
    assert_eq!(feedback.committed.len(), 1);
    assert_eq!(at(&c, "gf_rigid"), (150.0, 110.0));

    c.drag_end(gesture, &NodeState::at(150.0, 60.0));
    assert_eq!(at(&c, "gf_rigid_img"), (150.0, 60.0));
    assert_eq!(at(&c, "gf_rigid"), (150.0, 110.0));
}

#[test]
fn movable_hosted_image_is_clamped_inside_frame() {
    let mut c = coordinator(hosted_pair("gf_clamp", "gf_clamp_img"));
    let image = ElementId::intern("gf_clamp_img");
    assert!(c.toggle_movable(image));
    let scene = c.document().elements().to_vec();

    let mut gesture = c.drag_start(image).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(150.0, 60.0), &StoredBounds(&scene));
    assert_eq!(feedback.preview, Some(Bounds::new(100.0, 60.0, 200.0, 200.0)));
    assert!(feedback.committed.is_empty());

    let update = c.drag_end(gesture, &NodeState::at(150.0, -80.0)).unwrap();
    assert_eq!((update.x, update.y), (Some(100.0), Some(0.0)));
    assert_eq!(at(&c, "gf_clamp"), (100.0, 100.0));

    assert!(!c.toggle_movable(image));
}

#[test]
fn canvas_resize_refits_contained_image() {
    let slot = with_fit(frame("gf_contain", 0.0, 100.0, 200.0, 100.0), FitMode::Fit);
    let mut image = photo("gf_contain_img", 50.0, 100.0, 100.0, 100.0);
    image.frame_id = Some(slot.id);
    let mut c = coordinator(vec![slot, image]);

    assert!(c.resize_canvas(2000.0, 1000.0));
    let slot = c.document().element(ElementId::intern("gf_contain")).unwrap();
    assert_eq!(slot.bounding_box(), Bounds::new(0.0, 100.0, 400.0, 100.0));

    let fitted = c.document().element(ElementId::intern("gf_contain_img")).unwrap();
    assert_eq!(fitted.bounding_box(), Bounds::new(150.0, 100.0, 100.0, 100.0));
    assert_eq!(fitted.percent.x, Some(0.075));
    assert_eq!(fitted.percent.width, Some(0.05));
    assert_eq!(fitted.frame_id, Some(slot.id));
}

// ─── Transforms ─────────────────────────────────────────────────────────

#[test]
fn frame_transform_refits_image() {
    let mut c = coordinator(hosted_pair("gf_grow", "gf_grow_img"));
    let result = c
        .transform_end(
            ElementId::intern("gf_grow"),
            &NodeState::at(100.0, 100.0).with_scale(2.0, 1.0),
        )
        .unwrap();
    assert_eq!((result.node.scale_x, result.node.scale_y), (1.0, 1.0));

    let image = c.document().element(ElementId::intern("gf_grow_img")).unwrap();
    assert_eq!(image.bounding_box(), Bounds::new(100.0, -50.0, 400.0, 400.0));
}

#[test]
fn hosted_image_transform_rescales_frame() {
    let mut c = coordinator(hosted_pair("gf_follow", "gf_follow_img"));
    c.transform_end(
        ElementId::intern("gf_follow_img"),
        &NodeState::at(100.0, 50.0).with_scale(1.5, 1.5),
    );

    let slot = c.document().element(ElementId::intern("gf_follow")).unwrap();
    assert_eq!(slot.bounding_box(), Bounds::new(100.0, 125.0, 300.0, 150.0));
    assert_eq!(slot.percent.width, Some(0.3));
}

#[test]
fn circle_transform_keeps_center_and_resets_scale() {
    let mut c = coordinator(vec![CanvasElement::new(
        ElementId::intern("gf_dot"),
        80.0,
        80.0,
        Shape::Circle(Circle { radius: 20.0 }),
    )]);
    let result = c
        .transform_end(
            ElementId::intern("gf_dot"),
            &NodeState::at(100.0, 100.0).with_scale(2.0, 2.0),
        )
        .unwrap();
    assert_eq!(result.update.radius, Some(40.0));
    assert_eq!((result.node.x, result.node.y), (100.0, 100.0));
    let dot = c.document().element(ElementId::intern("gf_dot")).unwrap();
    assert_eq!(dot.native_anchor(), (100.0, 100.0));
}

// ─── Guides ─────────────────────────────────────────────────────────────

#[test]
fn drag_move_reports_guides_against_siblings() {
    let mut c = coordinator(vec![
        rect("gf_guide_a", 100.0, 100.0, 100.0, 60.0),
        rect("gf_guide_b", 300.0, 500.0, 80.0, 50.0),
    ]);
    let scene = c.document().elements().to_vec();
    let a = ElementId::intern("gf_guide_a");

    let mut gesture = c.drag_start(ElementId::intern("gf_guide_b")).unwrap();
    let feedback = c.drag_move(&mut gesture, &NodeState::at(203.0, 100.0), &StoredBounds(&scene));
    assert!(feedback.guides.iter().any(|g| g.target == Some(a)));
    // Guides never commit.
    assert_eq!(at(&c, "gf_guide_b"), (300.0, 500.0));
    c.drag_cancel(gesture);
}
