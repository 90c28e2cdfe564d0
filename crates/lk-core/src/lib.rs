pub mod branding;
pub mod config;
pub mod document;
pub mod frame;
pub mod geometry;
pub mod guides;
pub mod id;
pub mod model;
pub mod path;
pub mod percent;
pub mod rescale;
pub mod snap;

pub use branding::{BrandRef, Branding, ResolvedStyle};
pub use config::EngineConfig;
pub use document::{Design, DocumentError};
pub use frame::{DropTarget, FitMode, FitPlacement, compute_fit};
pub use geometry::{MIN_SCALE, ShapeGeometry, TransformResult};
pub use guides::{GuideKind, GuideLine, GuideOrientation, SceneLookup, StoredBounds};
pub use id::ElementId;
pub use model::*;
pub use rescale::{StageScale, rescale};
pub use snap::{SnapPosition, calculate_snapping_position};
