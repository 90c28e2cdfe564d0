//! Conversions between absolute pixels and stage-relative fractions.
//!
//! Every write of a `*_percent` field goes through these functions. Stage
//! dimensions must be positive; a zero dimension yields `inf`/`NaN` rather
//! than an error.

use crate::model::{CanvasElement, PercentMirror, StageSize};

pub fn to_percent(value: f64, total: f64) -> f64 {
    value / total
}

pub fn from_percent(fraction: f64, total: f64) -> f64 {
    fraction * total
}

/// Font sizes are normalised against the mean of the stage's width and
/// height so text keeps its visual weight under non-uniform aspect changes.
pub fn to_percent_font_size(font_size: f64, stage_width: f64, stage_height: f64) -> f64 {
    font_size / ((stage_width + stage_height) / 2.0)
}

pub fn from_percent_font_size(fraction: f64, stage_width: f64, stage_height: f64) -> f64 {
    fraction * ((stage_width + stage_height) / 2.0)
}

/// Position-only mirror, as written by drag commits.
pub fn position_mirror(x: f64, y: f64, stage: StageSize) -> PercentMirror {
    PercentMirror {
        x: Some(to_percent(x, stage.width)),
        y: Some(to_percent(y, stage.height)),
        ..PercentMirror::default()
    }
}

/// Full mirror of an element's current geometry against `stage`.
///
/// Width and height mirror the element's bounding box, so radius-based
/// shapes record their diameter.
pub fn mirror_for(element: &CanvasElement, stage: StageSize) -> PercentMirror {
    let bounds = element.bounding_box();
    PercentMirror {
        x: Some(to_percent(element.x, stage.width)),
        y: Some(to_percent(element.y, stage.height)),
        width: Some(to_percent(bounds.width, stage.width)),
        height: Some(to_percent(bounds.height, stage.height)),
        font_size: element
            .font_size()
            .map(|size| to_percent_font_size(size, stage.width, stage.height)),
    }
}
