//! Shape geometry resolvers.
//!
//! Each shape payload implements [`ShapeGeometry`], which normalises its
//! native parameterisation (corner, centre, radius or two-point based) into a
//! top-left bounding box and knows where the renderer reports its anchor.
//! [`Shape::geometry`] is the dispatch table; `CanvasElement` builds the drag
//! and transform commits on top of it.
//!
//! | shape | stored `x, y` | renderer anchor |
//! |-------|---------------|-----------------|
//! | rectangle, frame, image, text, group, icon | top-left | top-left |
//! | circle, triangle, star, ring, wedge | top-left of box | centre (`+radius`) |
//! | ellipse | top-left of box | centre (`+radiusX, +radiusY`) |
//! | line | segment origin | segment midpoint |

use crate::id::ElementId;
use crate::model::*;
use crate::path::path_bounds;
use crate::percent::{mirror_for, position_mirror};

/// Smallest scale factor folded into size fields. Zero, negative and
/// non-finite scales clamp to this so sizes never invert.
pub const MIN_SCALE: f64 = 1e-3;

pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > MIN_SCALE {
        scale
    } else {
        MIN_SCALE
    }
}

/// Geometry capability shared by every shape payload.
pub trait ShapeGeometry {
    /// Bounding box for a shape whose stored anchor is `(x, y)`.
    fn bounding_box(&self, x: f64, y: f64) -> Bounds;

    /// Offset from the stored anchor to the position the renderer reports.
    fn anchor_offset(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// This shape with a (clamped, positive) scale folded into its size fields.
    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape;
}

fn mean(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Square box of side `2 * radius` anchored at its top-left.
fn radial_box(x: f64, y: f64, radius: f64) -> Bounds {
    Bounds::new(x, y, radius * 2.0, radius * 2.0)
}

impl ShapeGeometry for Rectangle {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.width, self.height)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Rectangle(Rectangle {
            width: self.width * scale_x,
            height: self.height * scale_y,
            ..self.clone()
        })
    }
}

impl ShapeGeometry for Frame {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.width, self.height)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Frame(Frame {
            width: self.width * scale_x,
            height: self.height * scale_y,
            fit_mode: self.fit_mode,
        })
    }
}

impl ShapeGeometry for Image {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.width, self.height)
    }

    // Intrinsic dimensions survive a transform, even when they were only
    // implied by the display size.
    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        let mut next = self.clone();
        next.pin_intrinsic();
        next.width *= scale_x;
        next.height *= scale_y;
        Shape::Image(next)
    }
}

impl ShapeGeometry for Group {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.width, self.height)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Group(Group {
            width: self.width * scale_x,
            height: self.height * scale_y,
        })
    }
}

impl ShapeGeometry for Text {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.width, self.height)
    }

    /// Horizontal scale reflows the box; vertical scale grows the type.
    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Text(Text {
            width: self.width * scale_x,
            height: self.height * scale_y,
            font_size: self.font_size * scale_y,
            ..self.clone()
        })
    }
}

impl ShapeGeometry for Circle {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        radial_box(x, y, self.radius)
    }

    fn anchor_offset(&self) -> (f64, f64) {
        (self.radius, self.radius)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Circle(Circle {
            radius: self.radius * mean(scale_x, scale_y),
        })
    }
}

impl ShapeGeometry for Ellipse {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, self.radius_x * 2.0, self.radius_y * 2.0)
    }

    fn anchor_offset(&self) -> (f64, f64) {
        (self.radius_x, self.radius_y)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Ellipse(Ellipse {
            radius_x: self.radius_x * scale_x,
            radius_y: self.radius_y * scale_y,
        })
    }
}

impl ShapeGeometry for Triangle {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        radial_box(x, y, self.effective_radius())
    }

    fn anchor_offset(&self) -> (f64, f64) {
        let r = self.effective_radius();
        (r, r)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Triangle(Triangle {
            radius: Some(self.effective_radius() * mean(scale_x, scale_y)),
            width: self.width * scale_x,
            height: self.height * scale_y,
        })
    }
}

impl ShapeGeometry for Star {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        radial_box(x, y, self.outer_radius)
    }

    fn anchor_offset(&self) -> (f64, f64) {
        (self.outer_radius, self.outer_radius)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        let s = mean(scale_x, scale_y);
        Shape::Star(Star {
            num_points: self.num_points,
            inner_radius: self.inner_radius * s,
            outer_radius: self.outer_radius * s,
        })
    }
}

impl ShapeGeometry for Ring {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        radial_box(x, y, self.outer_radius)
    }

    fn anchor_offset(&self) -> (f64, f64) {
        (self.outer_radius, self.outer_radius)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        let s = mean(scale_x, scale_y);
        Shape::Ring(Ring {
            inner_radius: self.inner_radius * s,
            outer_radius: self.outer_radius * s,
        })
    }
}

impl ShapeGeometry for Wedge {
    // The full circle, so the wedge keeps its centre whatever the sweep.
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        radial_box(x, y, self.radius)
    }

    fn anchor_offset(&self) -> (f64, f64) {
        (self.radius, self.radius)
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Wedge(Wedge {
            radius: self.radius * mean(scale_x, scale_y),
            angle: self.angle,
        })
    }
}

impl ShapeGeometry for Line {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        let [x1, y1, x2, y2] = self.points;
        Bounds::new(
            x + x1.min(x2),
            y + y1.min(y2),
            (x2 - x1).abs(),
            (y2 - y1).abs(),
        )
    }

    fn anchor_offset(&self) -> (f64, f64) {
        self.midpoint()
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        let [x1, y1, x2, y2] = self.points;
        Shape::Line(Line {
            points: [x1 * scale_x, y1 * scale_y, x2 * scale_x, y2 * scale_y],
        })
    }
}

impl ShapeGeometry for Icon {
    fn bounding_box(&self, x: f64, y: f64) -> Bounds {
        match path_bounds(&self.path) {
            Some(natural) => Bounds::new(
                x + natural.x * self.scale_x,
                y + natural.y * self.scale_y,
                natural.width * self.scale_x,
                natural.height * self.scale_y,
            ),
            None => Bounds::new(x, y, 0.0, 0.0),
        }
    }

    fn scaled(&self, scale_x: f64, scale_y: f64) -> Shape {
        Shape::Icon(Icon {
            path: self.path.clone(),
            scale_x: self.scale_x * scale_x,
            scale_y: self.scale_y * scale_y,
        })
    }
}

impl Shape {
    /// Dispatch table from the type tag to its resolver.
    pub fn geometry(&self) -> &dyn ShapeGeometry {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Triangle(s) => s,
            Shape::Line(s) => s,
            Shape::Star(s) => s,
            Shape::Ring(s) => s,
            Shape::Wedge(s) => s,
            Shape::Icon(s) => s,
            Shape::Text(s) => s,
            Shape::Image(s) => s,
            Shape::Frame(s) => s,
            Shape::Group(s) => s,
        }
    }
}

/// Outcome of folding a transform into canonical fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Canonical update, percent mirrors included.
    pub update: ElementUpdate,
    /// State the renderer must reset its node to: same anchor, unit scale.
    pub node: NodeState,
}

impl CanvasElement {
    pub fn bounding_box(&self) -> Bounds {
        self.shape.geometry().bounding_box(self.x, self.y)
    }

    /// Where the renderer reports this element's position.
    pub fn native_anchor(&self) -> (f64, f64) {
        let (ox, oy) = self.shape.geometry().anchor_offset();
        (self.x + ox, self.y + oy)
    }

    /// Bounding box the element would have with its node reported at `node`.
    pub fn bounding_box_at(&self, node: &NodeState) -> Bounds {
        let (ax, ay) = self.native_anchor();
        self.bounding_box().translated(node.x - ax, node.y - ay)
    }

    /// Distance from the renderer-reported position to the bounding box's
    /// top-left corner. This is the offset the snapping engine needs.
    pub fn snap_offset(&self) -> (f64, f64) {
        let (ax, ay) = self.native_anchor();
        let bounds = self.bounding_box();
        (ax - bounds.x, ay - bounds.y)
    }

    /// Canonical commit for a drag ending with the node at `node`'s position.
    pub fn apply_drag(&self, node: &NodeState, stage: StageSize) -> ElementUpdate {
        let (ox, oy) = self.shape.geometry().anchor_offset();
        let x = node.x - ox;
        let y = node.y - oy;
        let mut update = ElementUpdate::new(self.id).with_position(x, y);
        update.percent = position_mirror(x, y, stage);
        update
    }

    /// Canonical commit for a transform: folds the node's scale into size
    /// fields, keeps the reported anchor where it is and resets the node's
    /// scale to 1.
    pub fn apply_transform(&self, node: &NodeState, stage: StageSize) -> TransformResult {
        let scale_x = clamp_scale(node.scale_x);
        let scale_y = clamp_scale(node.scale_y);
        let shape = self.shape.geometry().scaled(scale_x, scale_y);
        let (ox, oy) = shape.geometry().anchor_offset();

        let mut next = self.clone();
        next.shape = shape;
        next.x = node.x - ox;
        next.y = node.y - oy;
        next.rotation = node.rotation;

        let mut update = ElementUpdate::new(self.id)
            .with_position(next.x, next.y)
            .with_shape_fields(&next.shape);
        update.rotation = Some(node.rotation);
        update.percent = mirror_for(&next, stage);

        log::debug!(
            "transform {} ({:?}) scale {scale_x:.3}x{scale_y:.3}",
            self.id,
            self.kind()
        );

        TransformResult {
            update,
            node: NodeState {
                x: node.x,
                y: node.y,
                scale_x: 1.0,
                scale_y: 1.0,
                rotation: node.rotation,
            },
        }
    }
}

/// Position a node must be given so that `element`'s bounding box starts at
/// `(left, top)`.
pub fn anchor_for_box_origin(element: &CanvasElement, left: f64, top: f64) -> (f64, f64) {
    let (ox, oy) = element.snap_offset();
    (left + ox, top + oy)
}

/// Look up an element by id.
pub fn find(elements: &[CanvasElement], id: ElementId) -> Option<&CanvasElement> {
    elements.iter().find(|e| e.id == id)
}
