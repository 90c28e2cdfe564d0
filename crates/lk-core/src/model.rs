//! Canonical element model for the design canvas.
//!
//! A design is a flat list of `CanvasElement` values whose order is the
//! stacking order (last = topmost). Each element carries its shape-specific
//! geometry as a tagged `Shape` variant. The stored `x, y` anchor is the
//! top-left corner of the element's bounding box for every shape except
//! `line`, whose points are relative to `x, y`.
//!
//! Renderers report positions in each shape's *native* anchor (the centre for
//! circles, stars, rings, wedges and triangles), so converting between the two
//! conventions is the job of `geometry`.

use crate::branding::BrandRef;
use crate::frame::FitMode;
use crate::id::ElementId;
use serde::{Deserialize, Serialize, Serializer};

fn unit() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

// ─── Stage ───────────────────────────────────────────────────────────────

/// The canvas (stage) dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for StageSize {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
        }
    }
}

impl StageSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Positive, finite width and height. Every percent conversion assumes this.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Mean of width and height, the reference length for font sizes and radii.
    pub fn mean_extent(&self) -> f64 {
        (self.width + self.height) / 2.0
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned box in top-left / width / height form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x(), self.center_y())
    }

    /// Inclusive point containment.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.left() && px <= self.right() && py >= self.top() && py <= self.bottom()
    }

    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// The three vertical reference lines: left, centre, right.
    pub fn vertical_lines(&self) -> [f64; 3] {
        [self.left(), self.center_x(), self.right()]
    }

    /// The three horizontal reference lines: top, centre, bottom.
    pub fn horizontal_lines(&self) -> [f64; 3] {
        [self.top(), self.center_y(), self.bottom()]
    }
}

// ─── Rendered node state ─────────────────────────────────────────────────

/// What the rendering layer reports for a node at the end of (or during) a
/// gesture: its position in the shape's native anchor plus any transient
/// multiplicative scale the transformer applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub x: f64,
    pub y: f64,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl NodeState {
    /// An unscaled, unrotated node at `(x, y)`.
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }

    #[must_use]
    pub const fn with_scale(self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            ..self
        }
    }

    #[must_use]
    pub const fn with_rotation(self, rotation: f64) -> Self {
        Self { rotation, ..self }
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// Paint attributes. Colours may reference the branding table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<BrandRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<BrandRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

// ─── Percent mirror ──────────────────────────────────────────────────────

/// Stage-relative mirrors of an element's absolute geometry.
///
/// Always written through `percent::mirror_for`; never computed by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentMirror {
    #[serde(rename = "x_percent", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(rename = "y_percent", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(rename = "width_percent", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(rename = "height_percent", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(rename = "fontSize_percent", default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl PercentMirror {
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.font_size.is_none()
    }

    /// Overwrite fields that are `Some` in `other`.
    pub fn merge(&mut self, other: &PercentMirror) {
        if other.x.is_some() {
            self.x = other.x;
        }
        if other.y.is_some() {
            self.y = other.y;
        }
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.height.is_some() {
            self.height = other.height;
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub radius_x: f64,
    pub radius_y: f64,
}

/// Regular triangle. `radius` may be absent on elements created from a
/// width/height box; it is then derived as `max(width, height) / 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Triangle {
    pub fn effective_radius(&self) -> f64 {
        self.radius
            .unwrap_or_else(|| self.width.max(self.height) / 2.0)
    }
}

/// Straight segment `[x1, y1, x2, y2]`, relative to the element's `x, y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub points: [f64; 4],
}

impl Line {
    pub fn midpoint(&self) -> (f64, f64) {
        let [x1, y1, x2, y2] = self.points;
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

fn default_star_points() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Star {
    #[serde(default = "default_star_points")]
    pub num_points: u32,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    pub inner_radius: f64,
    pub outer_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    pub radius: f64,
    /// Sweep in degrees.
    pub angle: f64,
}

/// Vector icon drawn from SVG path data, sized by its scale factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    pub path: String,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(default)]
    pub text: String,
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<BrandRef>,
}

/// Bitmap image. `width`/`height` are the current (possibly fitted) display
/// size; `original_*` are the decoded intrinsic dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub src: String,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<f64>,
}

impl Image {
    /// Intrinsic size, falling back to the current display size until the
    /// image has been decoded.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        match (self.original_width, self.original_height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => (self.width, self.height),
        }
    }

    /// Whether `original_*` hold usable decoded dimensions.
    pub fn has_intrinsic(&self) -> bool {
        matches!(
            (self.original_width, self.original_height),
            (Some(w), Some(h)) if w > 0.0 && h > 0.0
        )
    }

    /// Record the display size as `original_*` while no decoded size is
    /// known. Call before resizing the display box.
    pub fn pin_intrinsic(&mut self) {
        if !self.has_intrinsic() {
            self.original_width = Some(self.width);
            self.original_height = Some(self.height);
        }
    }
}

/// Clipping container hosting at most one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fit_mode: FitMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub width: f64,
    pub height: f64,
}

/// Type tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Circle,
    Ellipse,
    Triangle,
    Line,
    Star,
    Ring,
    Wedge,
    Icon,
    Text,
    Image,
    Frame,
    Group,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        ElementKind::Rectangle,
        ElementKind::Circle,
        ElementKind::Ellipse,
        ElementKind::Triangle,
        ElementKind::Line,
        ElementKind::Star,
        ElementKind::Ring,
        ElementKind::Wedge,
        ElementKind::Icon,
        ElementKind::Text,
        ElementKind::Image,
        ElementKind::Frame,
        ElementKind::Group,
    ];

    /// The `type` tag used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Triangle => "triangle",
            ElementKind::Line => "line",
            ElementKind::Star => "star",
            ElementKind::Ring => "ring",
            ElementKind::Wedge => "wedge",
            ElementKind::Icon => "icon",
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Frame => "frame",
            ElementKind::Group => "group",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

/// Shape-specific geometry, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Ellipse(Ellipse),
    Triangle(Triangle),
    Line(Line),
    Star(Star),
    Ring(Ring),
    Wedge(Wedge),
    Icon(Icon),
    Text(Text),
    Image(Image),
    Frame(Frame),
    Group(Group),
}

impl Shape {
    pub fn kind(&self) -> ElementKind {
        match self {
            Shape::Rectangle(_) => ElementKind::Rectangle,
            Shape::Circle(_) => ElementKind::Circle,
            Shape::Ellipse(_) => ElementKind::Ellipse,
            Shape::Triangle(_) => ElementKind::Triangle,
            Shape::Line(_) => ElementKind::Line,
            Shape::Star(_) => ElementKind::Star,
            Shape::Ring(_) => ElementKind::Ring,
            Shape::Wedge(_) => ElementKind::Wedge,
            Shape::Icon(_) => ElementKind::Icon,
            Shape::Text(_) => ElementKind::Text,
            Shape::Image(_) => ElementKind::Image,
            Shape::Frame(_) => ElementKind::Frame,
            Shape::Group(_) => ElementKind::Group,
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// One graphical object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    pub id: ElementId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit")]
    pub opacity: f64,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub selected: bool,
    /// The frame hosting this element (images only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<ElementId>,
    #[serde(flatten)]
    pub style: Style,
    #[serde(flatten)]
    pub percent: PercentMirror,
    #[serde(flatten)]
    pub shape: Shape,
}

impl CanvasElement {
    pub fn new(id: ElementId, x: f64, y: f64, shape: Shape) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            selected: false,
            frame_id: None,
            style: Style::default(),
            percent: PercentMirror::default(),
            shape,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.shape.kind()
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.shape, Shape::Frame(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.shape, Shape::Image(_))
    }

    pub fn as_image(&self) -> Option<&Image> {
        match &self.shape {
            Shape::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match &self.shape {
            Shape::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn font_size(&self) -> Option<f64> {
        match &self.shape {
            Shape::Text(text) => Some(text.font_size),
            _ => None,
        }
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// Change to an element's frame relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLink {
    Attach(ElementId),
    Detach,
}

impl Serialize for FrameLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FrameLink::Attach(id) => id.serialize(serializer),
            FrameLink::Detach => serializer.serialize_none(),
        }
    }
}

/// A partial update keyed by element id, carrying only changed canonical
/// fields. Applied by the state container with merge-by-id semantics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementUpdate {
    pub id: ElementId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outer_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameLink>,
    #[serde(flatten)]
    pub percent: PercentMirror,
}

impl ElementUpdate {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            x: None,
            y: None,
            rotation: None,
            width: None,
            height: None,
            radius: None,
            radius_x: None,
            radius_y: None,
            inner_radius: None,
            outer_radius: None,
            scale_x: None,
            scale_y: None,
            font_size: None,
            original_width: None,
            original_height: None,
            points: None,
            text: None,
            frame_id: None,
            percent: PercentMirror::default(),
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_frame(mut self, link: FrameLink) -> Self {
        self.frame_id = Some(link);
        self
    }

    /// Copy every size field of `shape` into this update.
    #[must_use]
    pub fn with_shape_fields(mut self, shape: &Shape) -> Self {
        match shape {
            Shape::Rectangle(Rectangle { width, height, .. })
            | Shape::Frame(Frame { width, height, .. })
            | Shape::Group(Group { width, height }) => {
                self.width = Some(*width);
                self.height = Some(*height);
            }
            Shape::Image(image) => {
                self.width = Some(image.width);
                self.height = Some(image.height);
                self.original_width = image.original_width;
                self.original_height = image.original_height;
            }
            Shape::Text(text) => {
                self.width = Some(text.width);
                self.height = Some(text.height);
                self.font_size = Some(text.font_size);
            }
            Shape::Circle(circle) => self.radius = Some(circle.radius),
            Shape::Ellipse(ellipse) => {
                self.radius_x = Some(ellipse.radius_x);
                self.radius_y = Some(ellipse.radius_y);
            }
            Shape::Triangle(triangle) => {
                self.radius = Some(triangle.effective_radius());
                self.width = Some(triangle.width);
                self.height = Some(triangle.height);
            }
            Shape::Line(line) => self.points = Some(line.points),
            Shape::Star(Star {
                inner_radius,
                outer_radius,
                ..
            })
            | Shape::Ring(Ring {
                inner_radius,
                outer_radius,
            }) => {
                self.inner_radius = Some(*inner_radius);
                self.outer_radius = Some(*outer_radius);
            }
            Shape::Wedge(wedge) => self.radius = Some(wedge.radius),
            Shape::Icon(icon) => {
                self.scale_x = Some(icon.scale_x);
                self.scale_y = Some(icon.scale_y);
            }
        }
        self
    }

    /// Merge into `element`. Fields that have no meaning for the element's
    /// shape are ignored.
    pub fn apply_to(&self, element: &mut CanvasElement) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        match self.frame_id {
            Some(FrameLink::Attach(frame)) => element.frame_id = Some(frame),
            Some(FrameLink::Detach) => element.frame_id = None,
            None => {}
        }
        element.percent.merge(&self.percent);

        match &mut element.shape {
            Shape::Rectangle(Rectangle { width, height, .. })
            | Shape::Frame(Frame { width, height, .. })
            | Shape::Group(Group { width, height }) => {
                set(width, self.width);
                set(height, self.height);
            }
            Shape::Image(image) => {
                set(&mut image.width, self.width);
                set(&mut image.height, self.height);
                if self.original_width.is_some() && self.original_height.is_some() {
                    image.original_width = self.original_width;
                    image.original_height = self.original_height;
                }
            }
            Shape::Text(text) => {
                set(&mut text.width, self.width);
                set(&mut text.height, self.height);
                set(&mut text.font_size, self.font_size);
                if let Some(content) = &self.text {
                    text.text.clone_from(content);
                }
            }
            Shape::Circle(circle) => set(&mut circle.radius, self.radius),
            Shape::Ellipse(ellipse) => {
                set(&mut ellipse.radius_x, self.radius_x);
                set(&mut ellipse.radius_y, self.radius_y);
            }
            Shape::Triangle(triangle) => {
                set(&mut triangle.width, self.width);
                set(&mut triangle.height, self.height);
                if self.radius.is_some() {
                    triangle.radius = self.radius;
                }
            }
            Shape::Line(line) => {
                if let Some(points) = self.points {
                    line.points = points;
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
                set(inner_radius, self.inner_radius);
                set(outer_radius, self.outer_radius);
            }
            Shape::Wedge(wedge) => set(&mut wedge.radius, self.radius),
            Shape::Icon(icon) => {
                set(&mut icon.scale_x, self.scale_x);
                set(&mut icon.scale_y, self.scale_y);
            }
        }
    }
}

fn set(field: &mut f64, value: Option<f64>) {
    if let Some(v) = value {
        *field = v;
    }
}
