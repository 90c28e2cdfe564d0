//! Aspect-ratio rescaler.
//!
//! Maps every element from one stage size to another. Positions and
//! box-like sizes follow their own axis; radii and font sizes cannot stretch
//! non-uniformly and follow the ratio of the stages' mean extents, which is
//! the same reference length `percent` uses for font sizes. Percent mirrors
//! are stage-relative and left untouched.

use crate::model::*;

/// Scale factors between two stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageScale {
    pub x: f64,
    pub y: f64,
    /// Factor for radii and font sizes.
    pub uniform: f64,
}

impl StageScale {
    /// `None` if either stage is not a valid (positive, finite) size.
    pub fn between(old: StageSize, new: StageSize) -> Option<Self> {
        if !old.is_valid() || !new.is_valid() {
            return None;
        }
        Some(Self {
            x: new.width / old.width,
            y: new.height / old.height,
            uniform: new.mean_extent() / old.mean_extent(),
        })
    }
}

/// Rescale every element from `old` to `new`. Invalid stages leave the list
/// unchanged.
pub fn rescale(elements: &[CanvasElement], old: StageSize, new: StageSize) -> Vec<CanvasElement> {
    let Some(scale) = StageScale::between(old, new) else {
        log::warn!(
            "rescale skipped: invalid stage {}x{} -> {}x{}",
            old.width,
            old.height,
            new.width,
            new.height
        );
        return elements.to_vec();
    };

    log::debug!(
        "rescale {} elements by {:.4}x{:.4} (uniform {:.4})",
        elements.len(),
        scale.x,
        scale.y,
        scale.uniform
    );
    elements.iter().map(|e| rescale_element(e, scale)).collect()
}

pub fn rescale_element(element: &CanvasElement, scale: StageScale) -> CanvasElement {
    let StageScale { x: sx, y: sy, uniform: u } = scale;
    let mut next = element.clone();
    next.x *= sx;
    next.y *= sy;

    match &mut next.shape {
        Shape::Rectangle(Rectangle { width, height, .. })
        | Shape::Frame(Frame { width, height, .. })
        | Shape::Group(Group { width, height }) => {
            *width *= sx;
            *height *= sy;
        }
        Shape::Image(image) => {
            image.pin_intrinsic();
            image.width *= sx;
            image.height *= sy;
        }
        Shape::Text(text) => {
            text.width *= sx;
            text.height *= sy;
            text.font_size *= u;
        }
        Shape::Circle(circle) => circle.radius *= u,
        Shape::Wedge(wedge) => wedge.radius *= u,
        Shape::Ellipse(ellipse) => {
            ellipse.radius_x *= sx;
            ellipse.radius_y *= sy;
        }
        Shape::Triangle(triangle) => {
            triangle.width *= sx;
            triangle.height *= sy;
            if let Some(radius) = &mut triangle.radius {
                *radius *= u;
            }
        }
        Shape::Star(Star {
            inner_radius,
            outer_radius,
            ..
        })
        | Shape::Ring(Ring {
            inner_radius,
            outer_radius,
        }) => {
            *inner_radius *= u;
            *outer_radius *= u;
        }
        Shape::Line(line) => {
            let [x1, y1, x2, y2] = line.points;
            line.points = [x1 * sx, y1 * sy, x2 * sx, y2 * sy];
        }
        Shape::Icon(icon) => {
            icon.scale_x *= sx;
            icon.scale_y *= sy;
        }
    }
    next
}
